//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use vitrine_core::Error as CoreError;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// A destructive operation was requested without confirmation.
  #[error("{0}")]
  ConfirmationRequired(String),

  /// The remote store failed a precondition check.
  #[error("{0}")]
  Unavailable(String),

  /// The remote store rejected or failed an operation.
  #[error("{0}")]
  Upstream(String),

  #[error("internal error: {0}")]
  Internal(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl From<CoreError> for ApiError {
  fn from(e: CoreError) -> Self {
    match e {
      CoreError::RecordNotFound { .. } => ApiError::NotFound(e.to_string()),
      CoreError::ConfirmationRequired(_) => ApiError::ConfirmationRequired(e.to_string()),
      CoreError::SyncPrecondition { .. } => ApiError::Unavailable(e.to_string()),
      CoreError::Sync { .. } | CoreError::Remote(_) => ApiError::Upstream(e.to_string()),
      other => ApiError::Internal(Box::new(other)),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::ConfirmationRequired(_) => StatusCode::PRECONDITION_REQUIRED,
      ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
      ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
      ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
