//! Error types for the contacts API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use contact_store::StoreError;
use database::{DatabaseError, FieldError};
use thiserror::Error;

use crate::storage::StorageError;

/// Shown for failures whose detail stays in the logs.
const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Errors returned by API handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Avatar storage error.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Field-level validation failures.
    #[error("{} invalid field(s)", .0.len())]
    Validation(Vec<FieldError>),

    /// Missing, expired or wrong credentials.
    #[error("{0}")]
    Unauthorized(String),

    /// Malformed request.
    #[error("{0}")]
    BadRequest(String),

    /// An import file had no row with both a name and a phone number.
    #[error("No valid contacts found in file")]
    NoValidRows {
        rows_read: usize,
        expected_headers: Vec<&'static str>,
    },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(err) => ApiError::Database(err),
            StoreError::Invalid(errors) => ApiError::Validation(errors),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Database(DatabaseError::NotFound { entity, .. }) => (
                StatusCode::NOT_FOUND,
                serde_json::json!({ "error": format!("{} not found", entity) }),
            ),
            ApiError::Database(DatabaseError::AlreadyExists { entity, .. }) => (
                StatusCode::CONFLICT,
                serde_json::json!({ "error": format!("{} already exists", entity) }),
            ),
            ApiError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": GENERIC_MESSAGE }),
                )
            }
            ApiError::Storage(err) => {
                tracing::error!("Storage error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": GENERIC_MESSAGE }),
                )
            }
            ApiError::Validation(errors) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({ "error": "Validation failed", "fields": errors }),
            ),
            ApiError::Unauthorized(msg) => (
                StatusCode::UNAUTHORIZED,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::BadRequest(msg) => (
                StatusCode::BAD_REQUEST,
                serde_json::json!({ "error": msg }),
            ),
            ApiError::NoValidRows {
                rows_read,
                expected_headers,
            } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                serde_json::json!({
                    "error": "No valid contacts found in file. Please check the file format.",
                    "rows_read": rows_read,
                    "expected_headers": expected_headers,
                }),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    serde_json::json!({ "error": GENERIC_MESSAGE }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

/// Result type for API handlers.
pub type Result<T> = std::result::Result<T, ApiError>;
