use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use persistence::{ErrorKind, PersistenceError};
use serde_json::{json, Value};
use tracing::error;

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized: Admin access required. Please sign in.";

/// Handler failure, rendered as `{ "success": false, "error": ... }`.
#[derive(Debug, Clone, PartialEq)]
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

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unauthorized() -> Self {
        Self::new(StatusCode::UNAUTHORIZED, UNAUTHORIZED_MESSAGE)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status.as_u16(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<PersistenceError> for ApiError {
    fn from(e: PersistenceError) -> Self {
        if e.is_unauthorized() {
            return Self::unauthorized();
        }
        match e.kind {
            ErrorKind::NotFound => Self::not_found(e.message),
            ErrorKind::Invalid => Self::bad_request(e.message),
            _ => {
                error!(error = %e, "backend call failed");
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, e.message)
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(json!({ "success": false, "error": self.message })),
        )
            .into_response()
    }
}

/// Parses a raw request body as JSON.
pub fn json_body(raw: &[u8]) -> Result<Value, ApiError> {
    serde_json::from_slice(raw).map_err(|e| ApiError::bad_request(format!("Invalid JSON body: {e}")))
}
