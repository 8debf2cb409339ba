//! `POST /actions` and `GET /stats`.

use std::sync::Arc;

use axum::{Json, extract::State};
use parley_core::{
  Ledger, NotificationGateway, PlatformId, action::Action, ledger::LedgerStats,
};
use parley_relay::{ActionOutcome, Services};
use serde::Deserialize;

use crate::error::ApiError;

/// An affordance pressed on the chat transport.
#[derive(Debug, Deserialize)]
pub struct ActionBody {
  /// Who pressed it.
  pub actor:     PlatformId,
  /// The affordance's `action_id`, e.g. `close:<uuid>`.
  pub action_id: String,
  pub text:      Option<String>,
}

/// `POST /actions`
pub async fn dispatch<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Json(body): Json<ActionBody>,
) -> Result<Json<ActionOutcome>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  let action: Action = body
    .action_id
    .parse()
    .map_err(|e: parley_core::Error| ApiError::BadRequest(e.to_string()))?;
  let text = body.text.filter(|t| !t.trim().is_empty());
  Ok(Json(services.dispatch(body.actor, action, text).await?))
}

/// `GET /stats`
pub async fn stats<L, G>(
  State(services): State<Arc<Services<L, G>>>,
) -> Result<Json<LedgerStats>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  Ok(Json(services.stats().await?))
}
