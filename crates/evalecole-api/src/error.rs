//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use evalecole_core::{navigation::Route, submission::SubmissionError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("identifiant ou mot de passe incorrect")]
  Unauthorized,

  #[error("route not permitted: {}", .0.title())]
  Forbidden(Route),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Submission(#[from] SubmissionError),

  /// Carries the script an operator must run.
  #[error("the store needs provisioning")]
  ProvisioningRequired(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    ApiError::Store(Box::new(e))
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let message = self.to_string();
    match self {
      ApiError::Unauthorized => {
        let mut res =
          (StatusCode::UNAUTHORIZED, Json(json!({ "error": message }))).into_response();
        res.headers_mut().insert(
          header::WWW_AUTHENTICATE,
          HeaderValue::from_static("Basic realm=\"evalecole\""),
        );
        res
      }
      ApiError::ProvisioningRequired(script) => (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "error": message, "setup_script": script })),
      )
        .into_response(),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "error": message }))).into_response()
      }
      other => {
        let status = match other {
          ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
          ApiError::NotFound(_) => StatusCode::NOT_FOUND,
          ApiError::Submission(_) => StatusCode::UNPROCESSABLE_ENTITY,
          _ => StatusCode::BAD_REQUEST,
        };
        (status, Json(json!({ "error": message }))).into_response()
      }
    }
  }
}
