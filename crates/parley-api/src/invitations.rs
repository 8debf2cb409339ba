//! Handlers for `/invitations` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/invitations/redeem` | Body: `{"code":"…"}` or `{"payload":"invite_…"}` |
//! | `POST` | `/invitations/accept` | Body: `{"platform_id":1,"payload":"invite_…"}` |

use std::sync::Arc;

use axum::{Json, extract::State};
use parley_core::{Ledger, NotificationGateway, PlatformId};
use parley_relay::{Services, registration::Acceptance};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ApiError;

// ─── Redeem ───────────────────────────────────────────────────────────────────

/// Exactly one of `code` or `payload` must be present.
#[derive(Debug, Deserialize)]
pub struct RedeemBody {
  pub code:    Option<String>,
  pub payload: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Redeemed {
  pub provider_id: Uuid,
}

/// `POST /invitations/redeem`
pub async fn redeem<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Json(body): Json<RedeemBody>,
) -> Result<Json<Redeemed>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  let provider_id = match (body.code, body.payload) {
    (Some(code), None) => services.invitations.redeem(&code).await?,
    (None, Some(payload)) => services.invitations.redeem_payload(&payload).await?,
    _ => {
      return Err(ApiError::BadRequest(
        "exactly one of code or payload is required".into(),
      ));
    }
  };
  Ok(Json(Redeemed { provider_id }))
}

// ─── Accept ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct AcceptBody {
  pub platform_id: PlatformId,
  pub payload:     String,
}

/// `POST /invitations/accept`: what a bot does on `/start invite_<code>`.
pub async fn accept<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Json(body): Json<AcceptBody>,
) -> Result<Json<Acceptance>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  let acceptance = services
    .registrar
    .accept_invitation(body.platform_id, &body.payload)
    .await?;
  Ok(Json(acceptance))
}
