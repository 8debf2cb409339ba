//! Handlers for `/registration` endpoints, one conversation per platform
//! identity.

use std::sync::Arc;

use axum::{
  Json,
  extract::{Path, State},
};
use parley_core::{
  Ledger, NotificationGateway, PlatformId,
  registration::{Prompt, RegistrationInput},
};
use parley_relay::{Services, registration::RegistrationOutcome};

use crate::error::ApiError;

/// `POST /registration/{platform_id}`: starts a provider application.
pub async fn begin<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Path(platform_id): Path<PlatformId>,
) -> Result<Json<Prompt>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  Ok(Json(services.registrar.begin_provider(platform_id).await?))
}

/// `POST /registration/{platform_id}/input`: body:
/// `{"kind":"text","text":"…"}` or `{"kind":"cancel"}`.
pub async fn input<L, G>(
  State(services): State<Arc<Services<L, G>>>,
  Path(platform_id): Path<PlatformId>,
  Json(input): Json<RegistrationInput>,
) -> Result<Json<RegistrationOutcome>, ApiError>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  Ok(Json(services.registrar.handle(platform_id, input).await?))
}
