//! Registry configuration.

use serde::{Deserialize, Serialize};

use claimsbook_core::{Address, CoreError};
use claimsbook_perms::PermissionMask;

use crate::error::Result;

/// Initial state of a new registry.
///
/// Role membership is exactly what is listed here. The owner is a change agent
/// or event reporter only if it appears in the corresponding list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    pub owner: Address,

    #[serde(default = "owner_default_mask")]
    pub owner_permissions: PermissionMask,

    #[serde(default)]
    pub change_agents: Vec<Address>,

    #[serde(default)]
    pub event_reporters: Vec<Address>,
}

fn owner_default_mask() -> PermissionMask {
    PermissionMask::OWNER_DEFAULT
}

impl Genesis {
    /// An owner holding the default mask (27) and no role members.
    pub fn new(owner: Address) -> Self {
        Self {
            owner,
            owner_permissions: PermissionMask::OWNER_DEFAULT,
            change_agents: Vec::new(),
            event_reporters: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_owner_permissions(mut self, mask: PermissionMask) -> Self {
        self.owner_permissions = mask;
        self
    }

    #[must_use]
    pub fn with_change_agent(mut self, addr: Address) -> Self {
        self.change_agents.push(addr);
        self
    }

    #[must_use]
    pub fn with_event_reporter(mut self, addr: Address) -> Self {
        self.event_reporters.push(addr);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reject a null owner or a null role member.
    pub fn validate(&self) -> std::result::Result<(), CoreError> {
        if self.owner.is_zero() {
            return Err(CoreError::InvalidArgument("owner is the zero address".into()));
        }
        let null_member = self
            .change_agents
            .iter()
            .chain(&self.event_reporters)
            .any(Address::is_zero);
        if null_member {
            return Err(CoreError::InvalidArgument(
                "role member is the zero address".into(),
            ));
        }
        Ok(())
    }
}

/// Runtime configuration for a [`Registry`](crate::Registry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Check the persisted log's seqs and links when opening.
    pub verify_log_on_open: bool,

    /// Buffer size of the committed-entry broadcast channel. Slow subscribers
    /// that fall further behind than this miss entries.
    pub event_channel_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            verify_log_on_open: true,
            event_channel_capacity: 1024,
        }
    }
}

impl RegistryConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_genesis_defaults() {
        let owner = Address::from_bytes([1; 20]);
        let genesis = Genesis::new(owner);
        assert_eq!(genesis.owner_permissions.bits(), 27);
        assert!(genesis.change_agents.is_empty());
        assert!(genesis.event_reporters.is_empty());
        assert!(genesis.validate().is_ok());
    }

    #[test]
    fn test_genesis_from_json() {
        let json = r#"{
            "owner": "0x0101010101010101010101010101010101010101",
            "change_agents": ["0x0202020202020202020202020202020202020202"]
        }"#;
        let genesis = Genesis::from_json(json).unwrap();
        assert_eq!(genesis.owner, Address::from_bytes([1; 20]));
        assert_eq!(genesis.owner_permissions, PermissionMask::OWNER_DEFAULT);
        assert_eq!(genesis.change_agents, vec![Address::from_bytes([2; 20])]);
        assert!(genesis.event_reporters.is_empty());
    }

    #[test]
    fn test_genesis_rejects_null_addresses() {
        assert!(Genesis::new(Address::ZERO).validate().is_err());
        let genesis = Genesis::new(Address::from_bytes([1; 20])).with_event_reporter(Address::ZERO);
        assert!(genesis.validate().is_err());
    }

    #[test]
    fn test_config_from_json() {
        let config = RegistryConfig::from_json(r#"{"event_channel_capacity": 16}"#).unwrap();
        assert!(config.verify_log_on_open);
        assert_eq!(config.event_channel_capacity, 16);

        assert!(RegistryConfig::from_json("{").is_err());
    }
}
