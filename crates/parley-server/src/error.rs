//! Error types and axum `IntoResponse` implementation.

use axum::{
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
  #[error("unauthorized")]
  Unauthorized,

  /// The Bot API could not be reached. The URL is stripped because it
  /// carries the bot token.
  #[error("telegram transport error: {0}")]
  Transport(#[source] reqwest::Error),

  /// The Bot API answered with `"ok": false`.
  #[error("telegram rejected the request: {0}")]
  Telegram(String),
}

impl IntoResponse for Error {
  fn into_response(self) -> Response {
    match self {
      Error::Unauthorized => {
        let mut res =
          (StatusCode::UNAUTHORIZED, "Unauthorized").into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"parley\""),
        );
        res
      }
      Error::Transport(_) | Error::Telegram(_) => {
        (StatusCode::BAD_GATEWAY, self.to_string()).into_response()
      }
    }
  }
}
