//! Error types for the registry.

use claimsbook_core::{ChainError, CoreError, ErrorKind};
use claimsbook_perms::PermsError;
use claimsbook_store::StoreError;
use thiserror::Error;

/// Errors that can occur during registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The call was rejected or a value failed to encode.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Storage error.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Persisted state or log failed an integrity check.
    #[error("registry corrupted: {0}")]
    Corrupted(String),

    /// Configuration could not be parsed.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}

impl RegistryError {
    /// The rule a rejected call broke, if this is a rejection.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            RegistryError::Core(err) => Some(err.kind()),
            _ => None,
        }
    }
}

impl From<PermsError> for RegistryError {
    fn from(err: PermsError) -> Self {
        RegistryError::Core(err.into())
    }
}

impl From<ChainError> for RegistryError {
    fn from(err: ChainError) -> Self {
        RegistryError::Corrupted(err.to_string())
    }
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
