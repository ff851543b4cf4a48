//! Error types for the Claims Book core.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Address;

/// Errors surfaced by registry operations.
///
/// Every variant is a rejected precondition: the operation that produced it
/// wrote nothing and emitted nothing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// Caller lacks the role or permission bit the operation needs.
    #[error("unauthorized: {caller} lacks {required}")]
    Unauthorized { caller: Address, required: String },

    /// Zero or empty identifier, zero amount, zero claim type.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Duplicate create.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Reference to an absent claim, record or proof.
    #[error("not found: {0}")]
    NotFound(String),

    /// Role or permission update requesting the value already in place.
    #[error("no-op update rejected: {0}")]
    NoOpRejected(String),

    /// Transition not allowed from the current state.
    #[error("invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("decoding error: {0}")]
    Decoding(String),
}

/// Coarse classification of a [`CoreError`], stable for callers that only
/// care which rule was broken.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Unauthorized,
    InvalidArgument,
    AlreadyExists,
    NotFound,
    NoOpRejected,
    InvalidStateTransition,
    Codec,
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::Unauthorized { .. } => ErrorKind::Unauthorized,
            CoreError::InvalidArgument(_) => ErrorKind::InvalidArgument,
            CoreError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            CoreError::NotFound(_) => ErrorKind::NotFound,
            CoreError::NoOpRejected(_) => ErrorKind::NoOpRejected,
            CoreError::InvalidStateTransition(_) => ErrorKind::InvalidStateTransition,
            CoreError::Encoding(_) | CoreError::Decoding(_) => ErrorKind::Codec,
        }
    }

    pub fn unauthorized(caller: &Address, required: impl Into<String>) -> Self {
        CoreError::Unauthorized {
            caller: *caller,
            required: required.into(),
        }
    }
}

/// Errors found while checking the integrity of an event log.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("invalid sequence number: expected {expected}, got {got}")]
    InvalidSequence { expected: u64, got: u64 },

    #[error("broken prev link at seq {seq}")]
    BrokenLink { seq: u64 },

    #[error("block number went backwards at seq {seq}")]
    BlockRegression { seq: u64 },

    #[error("timestamp went backwards at seq {seq}")]
    TimestampRegression { seq: u64 },

    #[error("entry {seq} could not be encoded: {reason}")]
    Unencodable { seq: u64, reason: String },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
