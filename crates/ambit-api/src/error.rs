//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized: {0}")]
  Unauthorized(String),

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("unprocessable: {0}")]
  Unprocessable(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Map a store error onto HTTP semantics.
  ///
  /// Store backends wrap the core error taxonomy; walk the source chain and
  /// translate the first core error found. Anything else is a 500.
  pub fn from_store<E>(err: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(err);
    match classify(boxed.as_ref()) {
      Some(api) => api,
      None => ApiError::Store(boxed),
    }
  }
}

impl From<ambit_core::Error> for ApiError {
  fn from(err: ambit_core::Error) -> Self { Self::from_store(err) }
}

fn classify(err: &(dyn std::error::Error + 'static)) -> Option<ApiError> {
  let mut current: Option<&(dyn std::error::Error + 'static)> = Some(err);
  while let Some(e) = current {
    if let Some(core) = e.downcast_ref::<ambit_core::Error>() {
      use ambit_core::Error as E;
      return match core {
        E::ClientNotFound(_) | E::EdgeNotFound { .. } => {
          Some(ApiError::NotFound(core.to_string()))
        }
        E::DuplicateEdge { .. } | E::DuplicatePrimary(_) => {
          Some(ApiError::Conflict(core.to_string()))
        }
        E::LastActiveAssignment(_) => {
          Some(ApiError::Unprocessable(core.to_string()))
        }
        E::InvalidRole(_) | E::UnknownRoleCode(_) => {
          Some(ApiError::BadRequest(core.to_string()))
        }
        E::Unauthorized { .. } => Some(ApiError::Forbidden(core.to_string())),
        E::Serialization(_) => None,
      };
    }
    current = e.source();
  }
  None
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m.clone()),
      ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m.clone()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Unprocessable(m) => {
        (StatusCode::UNPROCESSABLE_ENTITY, m.clone())
      }
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
