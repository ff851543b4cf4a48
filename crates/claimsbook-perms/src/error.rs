//! Error types for the permissions module.

use thiserror::Error;

use claimsbook_core::{Address, CoreError};

use crate::permission::{Permission, Role};

/// Errors that can occur during permission checks and updates.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PermsError {
    /// Caller is not the owner.
    #[error("{0} is not the owner")]
    NotOwner(Address),

    /// Caller does not hold a role.
    #[error("{caller} is not a {role}")]
    MissingRole { caller: Address, role: Role },

    /// Caller's mask lacks a permission bit.
    #[error("{caller} lacks the {permission} permission")]
    MissingPermission {
        caller: Address,
        permission: Permission,
    },

    /// Target identity is the null address.
    #[error("target address is the zero address")]
    NullTarget,

    /// Update would leave the stored value unchanged.
    #[error("{0}")]
    Unchanged(String),
}

impl From<PermsError> for CoreError {
    fn from(err: PermsError) -> Self {
        match err {
            PermsError::NotOwner(caller) => CoreError::unauthorized(&caller, "owner"),
            PermsError::MissingRole { caller, role } => {
                CoreError::unauthorized(&caller, role.to_string())
            }
            PermsError::MissingPermission { caller, permission } => {
                CoreError::unauthorized(&caller, format!("{permission} permission"))
            }
            PermsError::NullTarget => {
                CoreError::InvalidArgument("target address is the zero address".into())
            }
            PermsError::Unchanged(msg) => CoreError::NoOpRejected(msg),
        }
    }
}

/// Result type for permission operations.
pub type Result<T> = std::result::Result<T, PermsError>;
