//! Error types for named query operations

use thiserror::Error;

/// Result type alias for named query operations
pub type QueryResult<T> = Result<T, QueryError>;

/// Main error type for the model, validation and store layers
#[derive(Debug, Error)]
pub enum QueryError {
    /// No record exists with the given id
    #[error("Query not found: {0}")]
    NotFound(String),

    /// Request body failed schema validation
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Another record already uses this name
    #[error("Duplicate query name: {0}")]
    DuplicateName(String),

    /// Store-level failure (connection, corrupt collection, ...)
    #[error("Store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl QueryError {
    /// Create a new validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a new store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store(message.into())
    }

    /// Create a new not found error
    pub fn not_found(id: impl Into<String>) -> Self {
        Self::NotFound(id.into())
    }

    /// Explicit HTTP status carried by this error, if any.
    ///
    /// Only a missing record has one; every other failure is reported as a
    /// server error by the HTTP layer.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::NotFound(_) => Some(404),
            _ => None,
        }
    }
}
