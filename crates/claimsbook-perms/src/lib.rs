//! # Claims Book Permissions
//!
//! Access control for the registry.
//!
//! ## Overview
//!
//! Three mechanisms decide who may call what:
//!
//! - **Owner**: a single identity fixed at construction. Only the owner may
//!   change roles or permission masks.
//! - **Roles**: boolean membership sets. Change agents manage custody claims;
//!   event reporters relay token events.
//! - **Permission masks**: a bitmask per identity gating claim book record
//!   operations. See [`Permission`] for the bit layout.
//!
//! Nothing here is implicit. The owner is a change agent or event reporter only
//! if it was granted that role, and every mask starts at zero except the one
//! configured for the owner.

pub mod access;
pub mod error;
pub mod permission;

pub use access::AccessControl;
pub use error::{PermsError, Result};
pub use permission::{Permission, PermissionMask, Role};
