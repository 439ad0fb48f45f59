//! Error types for the vector store

use thiserror::Error;

/// Result type alias for store and query operations
pub type Result<T> = std::result::Result<T, VectorStoreError>;

/// Errors surfaced by the store and the query engine.
///
/// Every variant is a caller-correctable input error; nothing is retried
/// internally.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VectorStoreError {
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Invalid vector: {reason}")]
    InvalidVector { reason: String },

    #[error("Invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("Index error: {0}")]
    Index(String),
}

impl VectorStoreError {
    pub(crate) fn invalid_vector(reason: impl Into<String>) -> Self {
        VectorStoreError::InvalidVector {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_argument(reason: impl Into<String>) -> Self {
        VectorStoreError::InvalidArgument {
            reason: reason.into(),
        }
    }
}
