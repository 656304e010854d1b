use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::models::document::{FileId, LifecycleState};

/// Errors raised when addressing a tracked document.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum IntakeError {
    #[error("Document {0} is not tracked")]
    NotFound(FileId),

    #[error("Document {id} is not ready for analysis (state: {state})")]
    NotReady { id: FileId, state: LifecycleState },
}

impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let status = match self {
            IntakeError::NotFound(_) => StatusCode::NOT_FOUND,
            IntakeError::NotReady { .. } => StatusCode::CONFLICT,
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
