//! Storage error types.

use thiserror::Error;

/// Errors returned by repository operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// An entity with the same unique key already exists.
    #[error("already exists: {0}")]
    Duplicate(String),

    /// The backing store failed.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
