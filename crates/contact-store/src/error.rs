//! Contact store error types.

use database::{DatabaseError, FieldError};
use thiserror::Error;

/// Errors from the contact service and cache.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Backend failure or missing record.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    /// One or more contact fields failed validation.
    #[error("contact has {} invalid field(s)", .0.len())]
    Invalid(Vec<FieldError>),
}

impl StoreError {
    /// Whether this error reports a missing record.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Database(err) if err.is_not_found())
    }
}

/// Result type for contact store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
