//! Owner, role and permission state.
//!
//! [`AccessControl`] is plain data, persisted row by row along with the rest of
//! the registry. Every checked update validates fully before writing, so an
//! `Err` always leaves the state untouched.

use std::collections::{BTreeMap, BTreeSet};

use claimsbook_core::Address;

use crate::error::{PermsError, Result};
use crate::permission::{Permission, PermissionMask, Role};

/// Access control table for one registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessControl {
    owner: Address,

    /// Non-zero masks only; absent means 0.
    masks: BTreeMap<Address, PermissionMask>,

    change_agents: BTreeSet<Address>,

    event_reporters: BTreeSet<Address>,
}

impl AccessControl {
    /// Create a table owned by `owner`, holding `owner_mask`, with no role
    /// members.
    pub fn new(owner: Address, owner_mask: PermissionMask) -> Self {
        let mut masks = BTreeMap::new();
        if owner_mask != PermissionMask::NONE {
            masks.insert(owner, owner_mask);
        }
        Self {
            owner,
            masks,
            change_agents: BTreeSet::new(),
            event_reporters: BTreeSet::new(),
        }
    }

    pub fn owner(&self) -> &Address {
        &self.owner
    }

    pub fn is_owner(&self, addr: &Address) -> bool {
        self.owner == *addr
    }

    /// Add a role member while building the initial state. Bypasses the owner
    /// check; used only for genesis.
    pub fn grant_initial_role(&mut self, role: Role, addr: Address) {
        self.members_mut(role).insert(addr);
    }

    pub fn has_role(&self, role: Role, addr: &Address) -> bool {
        self.members(role).contains(addr)
    }

    pub fn is_change_agent(&self, addr: &Address) -> bool {
        self.has_role(Role::ChangeAgent, addr)
    }

    pub fn is_event_reporter(&self, addr: &Address) -> bool {
        self.has_role(Role::EventReporter, addr)
    }

    /// Current members of a role, in address order.
    pub fn role_members(&self, role: Role) -> impl Iterator<Item = &Address> {
        self.members(role).iter()
    }

    /// Every non-zero mask, in address order.
    pub fn masks(&self) -> impl Iterator<Item = (&Address, &PermissionMask)> {
        self.masks.iter()
    }

    /// The stored mask for `addr`, or 0.
    pub fn permissions(&self, addr: &Address) -> PermissionMask {
        self.masks.get(addr).copied().unwrap_or_default()
    }

    pub fn has_permission(&self, addr: &Address, permission: Permission) -> bool {
        self.permissions(addr).contains(permission)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Guards
    // ─────────────────────────────────────────────────────────────────────

    pub fn require_owner(&self, caller: &Address) -> Result<()> {
        if !self.is_owner(caller) {
            return Err(PermsError::NotOwner(*caller));
        }
        Ok(())
    }

    pub fn require_role(&self, caller: &Address, role: Role) -> Result<()> {
        if !self.has_role(role, caller) {
            return Err(PermsError::MissingRole {
                caller: *caller,
                role,
            });
        }
        Ok(())
    }

    pub fn require_permission(&self, caller: &Address, permission: Permission) -> Result<()> {
        if !self.has_permission(caller, permission) {
            return Err(PermsError::MissingPermission {
                caller: *caller,
                permission,
            });
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Owner-only updates
    // ─────────────────────────────────────────────────────────────────────

    /// Set or clear role membership for `addr`.
    ///
    /// Rejects a non-owner caller, the zero address, and a status equal to the
    /// current membership, in that order.
    pub fn update_role(
        &mut self,
        caller: &Address,
        role: Role,
        addr: Address,
        status: bool,
    ) -> Result<()> {
        self.require_owner(caller)?;
        if addr.is_zero() {
            return Err(PermsError::NullTarget);
        }
        if self.has_role(role, &addr) == status {
            return Err(PermsError::Unchanged(format!(
                "{addr} {} {role}",
                if status { "is already a" } else { "is not a" }
            )));
        }

        let members = self.members_mut(role);
        if status {
            members.insert(addr);
        } else {
            members.remove(&addr);
        }
        Ok(())
    }

    pub fn update_change_agent(
        &mut self,
        caller: &Address,
        addr: Address,
        status: bool,
    ) -> Result<()> {
        self.update_role(caller, Role::ChangeAgent, addr, status)
    }

    pub fn update_event_reporter(
        &mut self,
        caller: &Address,
        addr: Address,
        status: bool,
    ) -> Result<()> {
        self.update_role(caller, Role::EventReporter, addr, status)
    }

    /// Replace the mask for `addr`. The new mask is stored as given; it is not
    /// merged with the old one.
    pub fn set_permission(
        &mut self,
        caller: &Address,
        addr: Address,
        mask: PermissionMask,
    ) -> Result<()> {
        self.require_owner(caller)?;
        if addr.is_zero() {
            return Err(PermsError::NullTarget);
        }
        if self.permissions(&addr) == mask {
            return Err(PermsError::Unchanged(format!(
                "{addr} already holds mask {mask}"
            )));
        }

        if mask == PermissionMask::NONE {
            self.masks.remove(&addr);
        } else {
            self.masks.insert(addr, mask);
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Restore
    // ─────────────────────────────────────────────────────────────────────

    /// Set role membership without checks. Used to rebuild persisted state.
    pub fn restore_role(&mut self, role: Role, addr: Address, member: bool) {
        let members = self.members_mut(role);
        if member {
            members.insert(addr);
        } else {
            members.remove(&addr);
        }
    }

    /// Store a mask without checks. Used to rebuild persisted state.
    pub fn restore_mask(&mut self, addr: Address, mask: PermissionMask) {
        if mask == PermissionMask::NONE {
            self.masks.remove(&addr);
        } else {
            self.masks.insert(addr, mask);
        }
    }

    fn members(&self, role: Role) -> &BTreeSet<Address> {
        match role {
            Role::ChangeAgent => &self.change_agents,
            Role::EventReporter => &self.event_reporters,
        }
    }

    fn members_mut(&mut self, role: Role) -> &mut BTreeSet<Address> {
        match role {
            Role::ChangeAgent => &mut self.change_agents,
            Role::EventReporter => &mut self.event_reporters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimsbook_core::{CoreError, ErrorKind};

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    fn table() -> AccessControl {
        AccessControl::new(addr(1), PermissionMask::OWNER_DEFAULT)
    }

    #[test]
    fn test_defaults() {
        let acl = table();
        assert_eq!(acl.permissions(&addr(1)).bits(), 27);
        assert_eq!(acl.permissions(&addr(2)).bits(), 0);
        assert!(!acl.is_change_agent(&addr(1)));
        assert!(!acl.is_event_reporter(&addr(1)));
    }

    #[test]
    fn test_restore_bypasses_owner_checks() {
        let mut acl = table();
        acl.restore_role(Role::EventReporter, addr(3), true);
        acl.restore_mask(addr(3), PermissionMask::from_bits(8));
        assert!(acl.is_event_reporter(&addr(3)));
        assert_eq!(acl.permissions(&addr(3)).bits(), 8);

        acl.restore_role(Role::EventReporter, addr(3), false);
        acl.restore_mask(addr(3), PermissionMask::NONE);
        assert!(!acl.is_event_reporter(&addr(3)));
        assert_eq!(acl.masks().count(), 1);
    }

    #[test]
    fn test_initial_roles() {
        let mut acl = table();
        acl.grant_initial_role(Role::ChangeAgent, addr(1));
        assert!(acl.is_change_agent(&addr(1)));
        assert!(!acl.is_event_reporter(&addr(1)));
    }

    #[test]
    fn test_update_change_agent() {
        let mut acl = table();
        acl.update_change_agent(&addr(1), addr(2), true).unwrap();
        assert!(acl.is_change_agent(&addr(2)));
        acl.update_change_agent(&addr(1), addr(2), false).unwrap();
        assert!(!acl.is_change_agent(&addr(2)));
    }

    #[test]
    fn test_update_role_rejections_leave_state() {
        let mut acl = table();
        let before = acl.clone();

        let err = acl.update_event_reporter(&addr(2), addr(3), true).unwrap_err();
        assert_eq!(err, PermsError::NotOwner(addr(2)));

        let err = acl.update_event_reporter(&addr(1), Address::ZERO, true).unwrap_err();
        assert_eq!(err, PermsError::NullTarget);

        let err = acl.update_event_reporter(&addr(1), addr(3), false).unwrap_err();
        assert!(matches!(err, PermsError::Unchanged(_)));

        assert_eq!(acl, before);
    }

    #[test]
    fn test_owner_check_precedes_argument_check() {
        let mut acl = table();
        let err = acl.update_change_agent(&addr(9), Address::ZERO, true).unwrap_err();
        assert_eq!(err, PermsError::NotOwner(addr(9)));
    }

    #[test]
    fn test_set_permission_replaces() {
        let mut acl = table();
        acl.set_permission(&addr(1), addr(2), PermissionMask::from_bits(9)).unwrap();
        acl.set_permission(&addr(1), addr(2), PermissionMask::from_bits(16)).unwrap();
        assert_eq!(acl.permissions(&addr(2)).bits(), 16);
        assert!(!acl.has_permission(&addr(2), Permission::Create));
    }

    #[test]
    fn test_set_permission_rejections() {
        let mut acl = table();
        acl.set_permission(&addr(1), addr(2), PermissionMask::from_bits(1)).unwrap();
        let before = acl.clone();

        assert_eq!(
            acl.set_permission(&addr(2), addr(2), PermissionMask::from_bits(3)),
            Err(PermsError::NotOwner(addr(2)))
        );
        assert_eq!(
            acl.set_permission(&addr(1), Address::ZERO, PermissionMask::from_bits(3)),
            Err(PermsError::NullTarget)
        );
        assert!(matches!(
            acl.set_permission(&addr(1), addr(2), PermissionMask::from_bits(1)),
            Err(PermsError::Unchanged(_))
        ));
        assert!(matches!(
            acl.set_permission(&addr(1), addr(3), PermissionMask::NONE),
            Err(PermsError::Unchanged(_))
        ));
        assert_eq!(acl, before);
    }

    #[test]
    fn test_clearing_mask_removes_entry() {
        let mut acl = table();
        acl.set_permission(&addr(1), addr(2), PermissionMask::from_bits(8)).unwrap();
        acl.set_permission(&addr(1), addr(2), PermissionMask::NONE).unwrap();
        assert_eq!(acl, table());
    }

    #[test]
    fn test_owner_can_drop_own_mask() {
        let mut acl = table();
        acl.set_permission(&addr(1), addr(1), PermissionMask::NONE).unwrap();
        assert!(!acl.has_permission(&addr(1), Permission::Create));
        assert!(acl.require_owner(&addr(1)).is_ok());
    }

    #[test]
    fn test_guards_map_to_core_kinds() {
        let acl = table();
        let err: CoreError = acl.require_role(&addr(1), Role::EventReporter).unwrap_err().into();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        let err: CoreError = acl
            .require_permission(&addr(2), Permission::ModifyStatus)
            .unwrap_err()
            .into();
        assert_eq!(err.kind(), ErrorKind::Unauthorized);
        let err: CoreError = PermsError::NullTarget.into();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
        let err: CoreError = PermsError::Unchanged("x".into()).into();
        assert_eq!(err.kind(), ErrorKind::NoOpRejected);
    }
}
