//! JSON REST API for Parley.
//!
//! Exposes an axum [`Router`] backed by a [`parley_relay::Services`] bundle.
//! Auth, TLS, and transport concerns are the caller's responsibility.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", parley_api::api_router(services.clone()))
//! ```

pub mod actions;
pub mod attachments;
pub mod clients;
pub mod dialogues;
pub mod error;
pub mod invitations;
pub mod providers;
pub mod registration;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post},
};
use parley_core::{Ledger, NotificationGateway};
use parley_relay::Services;

pub use error::ApiError;

/// Build a fully-materialised API router over `services`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<L, G>(services: Arc<Services<L, G>>) -> Router<()>
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  Router::new()
    // Providers
    .route(
      "/providers",
      get(providers::list::<L, G>).post(providers::create::<L, G>),
    )
    .route("/providers/{id}", get(providers::get_one::<L, G>))
    .route("/providers/{id}/approve", post(providers::approve::<L, G>))
    .route("/providers/{id}/reject", post(providers::reject::<L, G>))
    .route(
      "/providers/{id}/invitations",
      post(providers::issue_invitation::<L, G>),
    )
    .route("/providers/{id}/clients", get(providers::clients::<L, G>))
    .route("/providers/{id}/dialogues", get(providers::dialogues::<L, G>))
    // Invitations
    .route("/invitations/redeem", post(invitations::redeem::<L, G>))
    .route("/invitations/accept", post(invitations::accept::<L, G>))
    // Clients
    .route("/clients", post(clients::create::<L, G>))
    .route("/clients/{id}/providers", get(clients::providers::<L, G>))
    .route("/clients/{id}/dialogues", get(clients::dialogues::<L, G>))
    // Attachments
    .route("/attachments", post(attachments::bind::<L, G>))
    .route("/attachments/sweep", post(attachments::sweep::<L, G>))
    // Dialogues
    .route("/dialogues", post(dialogues::open::<L, G>))
    .route("/dialogues/{id}", get(dialogues::get_one::<L, G>))
    .route(
      "/dialogues/{id}/messages",
      get(dialogues::history::<L, G>).post(dialogues::relay::<L, G>),
    )
    .route("/dialogues/{id}/close", post(dialogues::close::<L, G>))
    // Registration
    .route("/registration/{platform_id}", post(registration::begin::<L, G>))
    .route(
      "/registration/{platform_id}/input",
      post(registration::input::<L, G>),
    )
    // Actions & stats
    .route("/actions", post(actions::dispatch::<L, G>))
    .route("/stats", get(actions::stats::<L, G>))
    .with_state(services)
}
