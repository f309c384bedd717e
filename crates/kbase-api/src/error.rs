//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{StatusCode, header},
  response::{IntoResponse, Response},
};
use kbase_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  /// Missing, malformed or expired credentials.
  #[error("unauthenticated: {0}")]
  Unauthenticated(String),

  /// Valid credentials for a principal that may not act.
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("internal error: {0}")]
  Internal(String),
}

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::Core(e) => match e {
        CoreError::NotFound { .. } => StatusCode::NOT_FOUND,
        CoreError::SlugConflict { .. } => StatusCode::CONFLICT,
        CoreError::InvalidParent { .. } => StatusCode::BAD_REQUEST,
        CoreError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        CoreError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
      },
      ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
      ApiError::Unauthorized(_) => StatusCode::FORBIDDEN,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    let body = Json(json!({ "error": self.to_string() }));
    match self {
      ApiError::Unauthenticated(_) => {
        (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
      }
      _ => (status, body).into_response(),
    }
  }
}
