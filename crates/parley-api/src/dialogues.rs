//! Handlers for `/dialogues` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/dialogues` | 201 when created, 200 when already active |
//! | `GET`  | `/dialogues/{id}` | 404 if not found |
//! | `GET`  | `/dialogues/{id}/messages` | Requires `?reader=<participant id>` |
//! | `POST` | `/dialogues/{id}/messages` | Body: `{"sender_id":"…","text":"…"}` |
//! | `POST` | `/dialogues/{id}/close` | Body: `{"initiator_id":"…"}` |

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
};
use parley_core::{
  Ledger, NotificationGateway,
  dialogue::{Dialogue, Message, OpenedDialogue},
};
use parley_relay::{Services, dialogue::RelayReceipt};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::ApiError;

// ─── Open ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OpenBody {
  pub client_id:   Uuid,
  pub provider_id: Uuid,
}

/// `POST /dialogues`
pub async fn open<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Json(body): Json<OpenBody>,
) -> Result<(StatusCode, Json<OpenedDialogue>), ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  let opened = services
    .dialogues
    .open(body.client_id, body.provider_id)
    .await?;
  let status = if opened.created { StatusCode::CREATED } else { StatusCode::OK };
  Ok((status, Json(opened)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /dialogues/{id}`
pub async fn get_one<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Dialogue>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  Ok(Json(services.dialogues.get(id).await?))
}

// ─── Messages ─────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub reader: Uuid,
}

/// `GET /dialogues/{id}/messages?reader=<id>`
pub async fn history<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Path(id): Path<Uuid>,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<Message>>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  Ok(Json(services.dialogues.history(id, params.reader).await?))
}

#[derive(Debug, Deserialize)]
pub struct RelayBody {
  pub sender_id: Uuid,
  pub text:      String,
}

/// `POST /dialogues/{id}/messages`
pub async fn relay<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<RelayBody>,
) -> Result<(StatusCode, Json<RelayReceipt>), ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  if body.text.trim().is_empty() {
    return Err(ApiError::BadRequest("text must not be empty".into()));
  }
  let receipt = services.dialogues.relay(id, body.sender_id, body.text).await?;
  Ok((StatusCode::CREATED, Json(receipt)))
}

// ─── Close ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct CloseBody {
  pub initiator_id: Uuid,
}

/// `POST /dialogues/{id}/close`
pub async fn close<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Path(id): Path<Uuid>,
  Json(body): Json<CloseBody>,
) -> Result<Json<Dialogue>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  Ok(Json(services.dialogues.close(id, body.initiator_id).await?))
}
