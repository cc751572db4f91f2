use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::document::DocumentError;
use crate::lifecycle::StartupError;
use crate::manager::ManagerError;
use crate::snapshots::PersistenceError;

/// Error body returned by every admin handler: `{"error": "..."}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<ManagerError> for ApiError {
    fn from(err: ManagerError) -> Self {
        let status = match &err {
            ManagerError::NotFound(_)
            | ManagerError::SnapshotNotFound(_)
            | ManagerError::Persistence(PersistenceError::NotFound(_)) => StatusCode::NOT_FOUND,
            ManagerError::Parse(_) | ManagerError::InvalidConfiguration(_) => StatusCode::BAD_REQUEST,
            ManagerError::Remote(_) => StatusCode::BAD_GATEWAY,
            ManagerError::Persistence(_) | ManagerError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            tracing::error!(error = %err, "Admin operation failed");
        }
        Self::new(status, err.to_string())
    }
}

impl From<DocumentError> for ApiError {
    fn from(err: DocumentError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl From<StartupError> for ApiError {
    fn from(err: StartupError) -> Self {
        Self::bad_request(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.message)
    }
}
