//! Handlers for `/clients` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/clients` | Idempotent per `platform_id` |
//! | `GET`  | `/clients/{id}/providers` | Providers with an unexpired attachment |
//! | `GET`  | `/clients/{id}/dialogues` | Active dialogues |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use parley_core::{
  Ledger, NotificationGateway, PlatformId,
  attachment::AttachedProvider,
  dialogue::Dialogue,
  party::{Client, NewClient},
};
use parley_relay::Services;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub platform_id:  PlatformId,
  pub display_name: String,
}

/// `POST /clients`: returns the existing row for a known identity.
pub async fn create<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Json(body): Json<CreateBody>,
) -> Result<Json<Client>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  let display_name = body.display_name.trim().to_owned();
  if display_name.is_empty() {
    return Err(ApiError::BadRequest("display_name must not be empty".into()));
  }
  let client = services
    .registrar
    .register_client(NewClient { platform_id: body.platform_id, display_name })
    .await?;
  Ok(Json(client))
}

/// `GET /clients/{id}/providers`
pub async fn providers<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<AttachedProvider>>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  services.client(id).await?;
  let providers = services.attachments.active_providers_for(id, services.now()).await?;
  Ok(Json(providers))
}

/// `GET /clients/{id}/dialogues`
pub async fn dialogues<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Dialogue>>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  services.client(id).await?;
  Ok(Json(services.dialogues.active_for_client(id).await?))
}
