//! HTTP host for Parley.
//!
//! Mounts the JSON API under `/api` behind basic auth, and provides the
//! configuration and notification gateways the binary wires together.

pub mod auth;
pub mod error;
pub mod gateway;
pub mod telegram;

pub use error::Error;

use std::{path::PathBuf, sync::Arc, time::Duration};

use axum::{Router, middleware, routing::get};
use parley_core::{
  Ledger, NotificationGateway, PlatformId, attachment::SubscriptionWindow,
};
use parley_relay::{RelayConfig, Services};
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use auth::{AuthConfig, require_auth};

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml` and
/// `PARLEY_*` environment variables.
#[derive(Deserialize, Clone)]
pub struct ServerConfig {
  #[serde(default = "default_host")]
  pub host:                String,
  #[serde(default = "default_port")]
  pub port:                u16,
  pub store_path:          PathBuf,
  #[serde(default = "default_subscription_days")]
  pub subscription_days:   i64,
  #[serde(default = "default_sweep_interval_secs")]
  pub sweep_interval_secs: u64,
  /// The chat identity that reviews provider applications.
  pub admin_platform_id:   PlatformId,
  /// Used to build `t.me` invitation links.
  #[serde(default)]
  pub bot_username:        Option<String>,
  /// Without a token, notifications are only logged.
  #[serde(default)]
  pub telegram_token:      Option<String>,
  pub auth_username:       String,
  pub auth_password_hash:  String,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_subscription_days() -> i64 { 30 }
fn default_sweep_interval_secs() -> u64 { 3600 }

impl ServerConfig {
  pub fn relay_config(&self) -> Result<RelayConfig, parley_core::Error> {
    Ok(RelayConfig {
      window:            SubscriptionWindow::days(self.subscription_days)?,
      bot_username:      self.bot_username.clone(),
      admin_platform_id: self.admin_platform_id,
    })
  }

  pub fn sweep_interval(&self) -> Duration {
    Duration::from_secs(self.sweep_interval_secs.max(1))
  }

  pub fn auth(&self) -> AuthConfig {
    AuthConfig {
      username:      self.auth_username.clone(),
      password_hash: self.auth_password_hash.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the server's [`Router`]: `/health` in the clear, the API under
/// `/api` behind basic auth, and request tracing around both.
pub fn router<L, G>(services: Arc<Services<L, G>>, auth: Arc<AuthConfig>) -> Router
where
  L: Ledger + 'static,
  G: NotificationGateway + 'static,
{
  let api = parley_api::api_router(services)
    .layer(middleware::from_fn_with_state(auth, require_auth));
  Router::new()
    .route("/health", get(|| async { "ok" }))
    .nest("/api", api)
    .layer(TraceLayer::new_for_http())
}

// ─── Integration tests ────────────────────────────────────────────────────────
