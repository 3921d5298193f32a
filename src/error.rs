// HTTP API error types
use serde_json::{json, Value};
use thiserror::Error;

use crate::server::response::Reply;
use crate::storage::StorageError;

/// API-surface errors with appropriate status codes and client-safe messages.
///
/// Storage and hashing faults are logged with their real cause and surfaced
/// to the caller as `Internal` with a generic message only.
#[derive(Debug, Error)]
pub enum ApiError {
    // 400 Bad Request - malformed or missing input
    #[error("{0}")]
    Validation(String),

    // 403 Forbidden - missing/invalid/expired token or ownership mismatch
    #[error("{0}")]
    Auth(String),

    // 404 Not Found
    #[error("{0}")]
    NotFound(String),

    // 400 - duplicate resource
    #[error("{0}")]
    Conflict(String),

    // 400 - per-user check quota reached
    #[error("{0}")]
    QuotaExceeded(String),

    // 405
    #[error("Method not allowed")]
    MethodNotAllowed,

    // 500 - storage failure or uncaught handler fault
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation(_) => 400,
            ApiError::Auth(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 400,
            ApiError::QuotaExceeded(_) => 400,
            ApiError::MethodNotAllowed => 405,
            ApiError::Internal(_) => 500,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "VALIDATION_ERROR",
            ApiError::Auth(_) => "AUTH_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::QuotaExceeded(_) => "QUOTA_EXCEEDED",
            ApiError::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        json!({
            "error": true,
            "message": self.message(),
            "code": self.error_code()
        })
    }

    /// Convert into the reply form the response encoder consumes
    pub fn into_reply(self) -> Reply {
        Reply::json(self.status_code(), self.to_json())
    }
}

// Static constructor methods
impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn auth(message: impl Into<String>) -> Self {
        ApiError::Auth(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn quota_exceeded(message: impl Into<String>) -> Self {
        ApiError::QuotaExceeded(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }
}

// Convert other error types to ApiError
impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::NotFound => ApiError::not_found("Record not found"),
            StorageError::AlreadyExists => ApiError::conflict("Record already exists"),
            StorageError::Io(detail) => {
                // Log the real error but return a generic message
                tracing::error!("storage I/O error: {}", detail);
                ApiError::internal("An error occurred while processing your request")
            }
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("record serialization error: {}", err);
        ApiError::internal("An error occurred while processing your request")
    }
}
