//! Error types for `parley-core`.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed deep-link payload: {0:?}")]
  MalformedDeepLink(String),

  #[error("malformed action id: {0:?}")]
  MalformedAction(String),

  #[error("subscription window must be positive")]
  NonPositiveWindow,

  #[error("subscription window must not exceed {max_days} days")]
  WindowTooLong { max_days: i64 },

  #[error("expiry falls outside the representable time range")]
  ExpiryOutOfRange,

  #[error("serialization error: {0}")]
  Serialization(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
