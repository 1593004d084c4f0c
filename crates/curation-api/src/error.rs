//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use strum::Display;
use thiserror::Error;

/// The snapshot-store call that failed during a dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum SnapshotOp {
  Save,
  Clear,
}

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  /// The action was applied but its snapshot could not be persisted.
  #[error("could not {op} snapshot: {source}")]
  Snapshot {
    op:     SnapshotOp,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  pub(crate) fn snapshot(op: SnapshotOp, e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Snapshot {
      op,
      source: Box::new(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
      ApiError::Snapshot { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn snapshot_error_names_the_operation() {
    let err = ApiError::snapshot(SnapshotOp::Clear, std::io::Error::other("disk full"));
    assert_eq!(err.to_string(), "could not clear snapshot: disk full");
    assert_eq!(err.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
  }
}
