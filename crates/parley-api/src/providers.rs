//! Handlers for `/providers` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/providers` | Optional `?status=pending\|approved\|rejected` |
//! | `POST` | `/providers` | Body: `{"platform_id":1,"display_name":"…"}`; 409 if known |
//! | `GET`  | `/providers/{id}` | 404 if not found |
//! | `POST` | `/providers/{id}/approve` | Body: `{"actor":1,"specialty":"…"}`; admin only |
//! | `POST` | `/providers/{id}/reject` | Body: `{"actor":1}`; admin only |
//! | `POST` | `/providers/{id}/invitations` | Issues a single-use invitation |
//! | `GET`  | `/providers/{id}/clients` | Clients with an unexpired attachment |
//! | `GET`  | `/providers/{id}/dialogues` | Active dialogues |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use parley_core::{
  Ledger, NotificationGateway, PlatformId,
  attachment::AttachedClient,
  dialogue::Dialogue,
  party::{ApprovalStatus, NewProvider, Provider},
};
use parley_relay::{Services, invitation::Invitation};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status: Option<ApprovalStatus>,
}

/// `GET /providers[?status=<status>]`
pub async fn list<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Provider>>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  Ok(Json(services.providers(params.status).await?))
}

// ─── Create ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CreateBody {
  pub platform_id:  PlatformId,
  pub display_name: String,
}

/// `POST /providers`: files a pending application and notifies the admin.
pub async fn create<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  let display_name = body.display_name.trim().to_owned();
  if display_name.is_empty() {
    return Err(ApiError::BadRequest("display_name must not be empty".into()));
  }
  let provider = services
    .registrar
    .register_provider(NewProvider { platform_id: body.platform_id, display_name })
    .await?;
  Ok((StatusCode::CREATED, Json(provider)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /providers/{id}`
pub async fn get_one<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Provider>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  Ok(Json(services.provider(id).await?))
}

// ─── Review ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ApproveBody {
  pub actor:     PlatformId,
  pub specialty: Option<String>,
}

/// `POST /providers/{id}/approve`
pub async fn approve<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<ApproveBody>,
) -> Result<Json<Provider>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  let specialty = body
    .specialty
    .map(|s| s.trim().to_owned())
    .filter(|s| !s.is_empty());
  let provider = services.registrar.approve(body.actor, id, specialty).await?;
  Ok(Json(provider))
}

#[derive(Debug, Deserialize)]
pub struct RejectBody {
  pub actor: PlatformId,
}

/// `POST /providers/{id}/reject`
pub async fn reject<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RejectBody>,
) -> Result<Json<Provider>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  Ok(Json(services.registrar.reject(body.actor, id).await?))
}

// ─── Invitations ──────────────────────────────────────────────────────────────

/// `POST /providers/{id}/invitations`
pub async fn issue_invitation<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Path(id): Path<Uuid>,
) -> Result<(StatusCode, Json<Invitation>), ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  let invitation = services.invitations.issue(id).await?;
  Ok((StatusCode::CREATED, Json(invitation)))
}

// ─── Relations ────────────────────────────────────────────────────────────────

/// `GET /providers/{id}/clients`
pub async fn clients<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<AttachedClient>>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  services.provider(id).await?;
  let clients = services.attachments.active_clients_for(id, services.now()).await?;
  Ok(Json(clients))
}

/// `GET /providers/{id}/dialogues`
pub async fn dialogues<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Vec<Dialogue>>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  services.provider(id).await?;
  Ok(Json(services.dialogues.active_for_provider(id).await?))
}
