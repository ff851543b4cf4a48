//! Keyed rows of registry state.
//!
//! Registry state is stored one row per owner, role membership, permission
//! mask, claim, record and proof. Values are opaque to the store.

use claimsbook_core::{Address, ClaimId};

use crate::error::{Result, StoreError};

/// Address of one row of registry state.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateKey {
    Owner,
    ChangeAgent(Address),
    EventReporter(Address),
    Permission(Address),
    Claim(ClaimId),
    Record(String),
    Proof(String),
}

impl StateKey {
    /// Name of the row group this key belongs to.
    pub fn kind(&self) -> &'static str {
        match self {
            StateKey::Owner => "owner",
            StateKey::ChangeAgent(_) => "change_agent",
            StateKey::EventReporter(_) => "event_reporter",
            StateKey::Permission(_) => "permission",
            StateKey::Claim(_) => "claim",
            StateKey::Record(_) => "record",
            StateKey::Proof(_) => "proof",
        }
    }

    /// Key bytes within the row group.
    pub fn key_bytes(&self) -> Vec<u8> {
        match self {
            StateKey::Owner => Vec::new(),
            StateKey::ChangeAgent(addr)
            | StateKey::EventReporter(addr)
            | StateKey::Permission(addr) => addr.as_bytes().to_vec(),
            StateKey::Claim(id) => id.get().to_be_bytes().to_vec(),
            StateKey::Record(id) | StateKey::Proof(id) => id.as_bytes().to_vec(),
        }
    }

    /// Inverse of [`kind`](Self::kind) and [`key_bytes`](Self::key_bytes).
    pub fn decode(kind: &str, key: &[u8]) -> Result<Self> {
        let invalid = || StoreError::InvalidData(format!("{kind} row key of {} bytes", key.len()));
        let address = || Address::try_from(key).map_err(|_| invalid());
        let text = || String::from_utf8(key.to_vec()).map_err(|_| invalid());

        match kind {
            "owner" if key.is_empty() => Ok(StateKey::Owner),
            "change_agent" => Ok(StateKey::ChangeAgent(address()?)),
            "event_reporter" => Ok(StateKey::EventReporter(address()?)),
            "permission" => Ok(StateKey::Permission(address()?)),
            "claim" => {
                let bytes: [u8; 8] = key.try_into().map_err(|_| invalid())?;
                Ok(StateKey::Claim(ClaimId(u64::from_be_bytes(bytes))))
            }
            "record" => Ok(StateKey::Record(text()?)),
            "proof" => Ok(StateKey::Proof(text()?)),
            "owner" => Err(invalid()),
            other => Err(StoreError::InvalidData(format!("unknown row kind {other:?}"))),
        }
    }
}

/// New value for one row; `None` removes the row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateWrite {
    pub key: StateKey,
    pub value: Option<Vec<u8>>,
}

impl StateWrite {
    pub fn put(key: StateKey, value: Vec<u8>) -> Self {
        Self {
            key,
            value: Some(value),
        }
    }

    pub fn delete(key: StateKey) -> Self {
        Self { key, value: None }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_decodes_back() {
        let keys = [
            StateKey::Owner,
            StateKey::ChangeAgent(Address::from_bytes([1; 20])),
            StateKey::EventReporter(Address::from_bytes([2; 20])),
            StateKey::Permission(Address::from_bytes([3; 20])),
            StateKey::Claim(ClaimId(u64::MAX)),
            StateKey::Record("R-1".into()),
            StateKey::Proof(String::new()),
        ];
        for key in keys {
            assert_eq!(StateKey::decode(key.kind(), &key.key_bytes()).unwrap(), key);
        }
    }

    #[test]
    fn test_malformed_keys_rejected() {
        assert!(StateKey::decode("owner", &[1]).is_err());
        assert!(StateKey::decode("permission", &[1; 19]).is_err());
        assert!(StateKey::decode("claim", &[1; 4]).is_err());
        assert!(StateKey::decode("record", &[0xff, 0xfe]).is_err());
        assert!(matches!(
            StateKey::decode("snapshot", &[]),
            Err(StoreError::InvalidData(_))
        ));
    }
}
