//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use parley_relay::Error as RelayError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Relay(#[from] RelayError),

  #[error("bad request: {0}")]
  BadRequest(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Relay(e) => match e {
        RelayError::NotFound(..) | RelayError::TokenNotFound => StatusCode::NOT_FOUND,
        RelayError::TokenAlreadyUsed
        | RelayError::DialogueClosed
        | RelayError::AlreadyRegistered => StatusCode::CONFLICT,
        RelayError::SubscriptionExpired => StatusCode::GONE,
        RelayError::PermissionDenied(_) => StatusCode::FORBIDDEN,
        RelayError::NoRegistration => StatusCode::BAD_REQUEST,
        RelayError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use parley_relay::Entity;
  use uuid::Uuid;

  use super::*;

  #[test]
  fn relay_errors_map_to_distinct_statuses() {
    let cases = [
      (RelayError::NotFound(Entity::Dialogue, Uuid::nil()), StatusCode::NOT_FOUND),
      (RelayError::TokenNotFound, StatusCode::NOT_FOUND),
      (RelayError::TokenAlreadyUsed, StatusCode::CONFLICT),
      (RelayError::DialogueClosed, StatusCode::CONFLICT),
      (RelayError::AlreadyRegistered, StatusCode::CONFLICT),
      (RelayError::SubscriptionExpired, StatusCode::GONE),
      (RelayError::PermissionDenied("no".into()), StatusCode::FORBIDDEN),
      (RelayError::NoRegistration, StatusCode::BAD_REQUEST),
    ];
    for (err, status) in cases {
      assert_eq!(ApiError::from(err).status(), status);
    }
  }
}
