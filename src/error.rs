use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failures of a single relay call. Each variant maps to one status code
/// and one stable `code` string in the error envelope.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("message store unavailable: {0}")]
    Store(String),

    #[error("completion failed: {0}")]
    Completion(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl RelayError {
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            RelayError::Store(_) => StatusCode::SERVICE_UNAVAILABLE,
            RelayError::Completion(_) => StatusCode::BAD_GATEWAY,
            RelayError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            RelayError::InvalidRequest(_) => "invalid_request",
            RelayError::Store(_) => "store_unavailable",
            RelayError::Completion(_) => "completion_failed",
            RelayError::Configuration(_) => "configuration",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// `{"error": {"code": ..., "message": ...}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorBody,
}

impl From<&RelayError> for ErrorEnvelope {
    fn from(err: &RelayError) -> Self {
        Self {
            error: ErrorBody {
                code: err.code().to_string(),
                message: err.to_string(),
            },
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        (self.status(), Json(ErrorEnvelope::from(&self))).into_response()
    }
}
