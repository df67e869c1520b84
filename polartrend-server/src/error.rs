//! Error types for polartrend-server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Resource not found (404)
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Invalid request (400), message aggregates all validation failures
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Missing/invalid session token or insufficient role (401)
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Conflict (409) - e.g., duplicate email
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),

    /// polartrend-common error
    #[error("Common error: {0}")]
    Common(#[from] polartrend_common::Error),
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Record not found".to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Other(ref err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
            ApiError::Common(polartrend_common::Error::NotFound(msg)) => {
                (StatusCode::NOT_FOUND, msg)
            }
            ApiError::Common(polartrend_common::Error::InvalidInput(msg)) => {
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::Common(ref err) => (StatusCode::INTERNAL_SERVER_ERROR, err.to_string()),
        };

        let body = Json(json!({
            "success": false,
            "message": message,
            "data": null,
        }));

        (status, body).into_response()
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
