//! Error type for `parley-relay`.

use std::fmt;

use thiserror::Error;
use uuid::Uuid;

/// The kind of record a [`Error::NotFound`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
  Provider,
  Client,
  Dialogue,
}

impl fmt::Display for Entity {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Self::Provider => "provider",
      Self::Client => "client",
      Self::Dialogue => "dialogue",
    })
  }
}

#[derive(Debug, Error)]
pub enum Error {
  #[error("{0} {1} not found")]
  NotFound(Entity, Uuid),

  #[error("invitation not found")]
  TokenNotFound,

  #[error("invitation has already been used")]
  TokenAlreadyUsed,

  #[error("subscription has expired")]
  SubscriptionExpired,

  #[error("dialogue is closed")]
  DialogueClosed,

  #[error("permission denied: {0}")]
  PermissionDenied(String),

  #[error("already registered")]
  AlreadyRegistered,

  #[error("no registration in progress")]
  NoRegistration,

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
  pub(crate) fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Store(Box::new(e))
  }

  pub(crate) fn denied(reason: impl Into<String>) -> Self {
    Self::PermissionDenied(reason.into())
  }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
