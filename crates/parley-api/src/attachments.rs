//! Handlers for `/attachments` endpoints.

use std::sync::Arc;

use axum::{Json, extract::State};
use chrono::{DateTime, Utc};
use parley_core::{Ledger, NotificationGateway};
use parley_relay::Services;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct BindBody {
  pub client_id:   Uuid,
  pub provider_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct Bound {
  pub expires_at: DateTime<Utc>,
}

/// `POST /attachments`: binds or refreshes the pair.
pub async fn bind<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Json(body): Json<BindBody>,
) -> Result<Json<Bound>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  let expires_at = services
    .attachments
    .bind(body.client_id, body.provider_id, services.now())
    .await?;
  Ok(Json(Bound { expires_at }))
}

#[derive(Debug, Serialize)]
pub struct Swept {
  pub removed: u64,
}

/// `POST /attachments/sweep`: runs one sweep now.
pub async fn sweep<L, G>(
  State(services): State<Arc<Services<L, G>>>,
) -> Result<Json<Swept>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  let removed = services.attachments.sweep_expired(services.now()).await?;
  Ok(Json(Swept { removed }))
}
