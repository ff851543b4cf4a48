//! Error types for the store module.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Log entry encoding error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Commit does not extend the stored log or block height.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Stored data failed an integrity check.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// A lock was poisoned or a blocking task failed.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<claimsbook_core::CoreError> for StoreError {
    fn from(err: claimsbook_core::CoreError) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;
