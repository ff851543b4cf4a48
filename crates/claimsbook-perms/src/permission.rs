//! Permission bits and roles.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single permission bit.
///
/// Bit positions are fixed and observable by integrators, so they must never
/// be renumbered. Bit 4 is unassigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum Permission {
    /// Create claim book records and attach proof data.
    Create = 1,

    /// Reserved. No operation requires it; it is part of the owner's mask
    /// for compatibility with existing integrations.
    Retrieve = 2,

    /// Update a record's status.
    ModifyStatus = 8,

    /// Update a record's verifier.
    ModifyVerifier = 16,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::Create,
        Permission::Retrieve,
        Permission::ModifyStatus,
        Permission::ModifyVerifier,
    ];

    pub const fn bit(self) -> u32 {
        self as u32
    }

    pub fn name(&self) -> &'static str {
        match self {
            Permission::Create => "CREATE",
            Permission::Retrieve => "RETRIEVE",
            Permission::ModifyStatus => "MODIFY_STATUS",
            Permission::ModifyVerifier => "MODIFY_VERIFIER",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A permission bitmask. Unassigned bits are stored as given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMask(pub u32);

impl PermissionMask {
    pub const NONE: Self = Self(0);

    /// The owner's mask at construction: CREATE | RETRIEVE | MODIFY_STATUS |
    /// MODIFY_VERIFIER = 27.
    pub const OWNER_DEFAULT: Self = Self(1 | 2 | 8 | 16);

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, permission: Permission) -> bool {
        self.0 & permission.bit() != 0
    }

    #[must_use]
    pub const fn with(self, permission: Permission) -> Self {
        Self(self.0 | permission.bit())
    }

    #[must_use]
    pub const fn without(self, permission: Permission) -> Self {
        Self(self.0 & !permission.bit())
    }

    /// Assigned permissions present in this mask.
    pub fn iter(self) -> impl Iterator<Item = Permission> {
        Permission::ALL.into_iter().filter(move |p| self.contains(*p))
    }
}

impl From<Permission> for PermissionMask {
    fn from(permission: Permission) -> Self {
        Self(permission.bit())
    }
}

impl FromIterator<Permission> for PermissionMask {
    fn from_iter<I: IntoIterator<Item = Permission>>(iter: I) -> Self {
        iter.into_iter().fold(Self::NONE, PermissionMask::with)
    }
}

impl fmt::Display for PermissionMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A boolean role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    ChangeAgent,
    EventReporter,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::ChangeAgent => f.write_str("change agent"),
            Role::EventReporter => f.write_str("event reporter"),
        }
    }
}
