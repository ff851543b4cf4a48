//! Registry events and log entries.
//!
//! Each successful mutating call emits exactly one [`RegistryEvent`], which the
//! event log wraps in a [`LogEntry`] with its position, block and timestamp.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::canonical::entry_id;
use crate::error::Result;
use crate::types::{Address, ClaimId, EventId};

/// An event emitted by the registry, with fields in indexer order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEvent {
    CreateClaim {
        claim_id: ClaimId,
        creator: Address,
    },
    RetrieveClaim {
        claim_id: ClaimId,
        retriever: Address,
    },
    FungibleTransfer {
        from: Address,
        to: Address,
        fungible_token: Address,
        nft_base: Address,
        amount: u128,
    },
    ObligatureSplit {
        token_owner: Address,
        nft_base: Address,
        obligature_id: u64,
        marketplace_id: u64,
    },
    ClaimCreated {
        claim_id: String,
        creator: Address,
    },
    ClaimProofDataCreated {
        claim_id: String,
        creator: Address,
    },
    ClaimStatusUpdated {
        claim_id: String,
        modifier: Address,
        claim_status: String,
    },
    ClaimVerifierUpdated {
        claim_id: String,
        modifier: Address,
        claim_verifier_id: String,
    },
}

/// Discriminator for filtering events by type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    CreateClaim,
    RetrieveClaim,
    FungibleTransfer,
    ObligatureSplit,
    ClaimCreated,
    ClaimProofDataCreated,
    ClaimStatusUpdated,
    ClaimVerifierUpdated,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::CreateClaim,
        EventKind::RetrieveClaim,
        EventKind::FungibleTransfer,
        EventKind::ObligatureSplit,
        EventKind::ClaimCreated,
        EventKind::ClaimProofDataCreated,
        EventKind::ClaimStatusUpdated,
        EventKind::ClaimVerifierUpdated,
    ];

    /// The event name indexers see.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::CreateClaim => "CreateClaim",
            EventKind::RetrieveClaim => "RetrieveClaim",
            EventKind::FungibleTransfer => "FungibleTransfer",
            EventKind::ObligatureSplit => "ObligatureSplit",
            EventKind::ClaimCreated => "ClaimCreated",
            EventKind::ClaimProofDataCreated => "ClaimProofDataCreated",
            EventKind::ClaimStatusUpdated => "ClaimStatusUpdated",
            EventKind::ClaimVerifierUpdated => "ClaimVerifierUpdated",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl RegistryEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            RegistryEvent::CreateClaim { .. } => EventKind::CreateClaim,
            RegistryEvent::RetrieveClaim { .. } => EventKind::RetrieveClaim,
            RegistryEvent::FungibleTransfer { .. } => EventKind::FungibleTransfer,
            RegistryEvent::ObligatureSplit { .. } => EventKind::ObligatureSplit,
            RegistryEvent::ClaimCreated { .. } => EventKind::ClaimCreated,
            RegistryEvent::ClaimProofDataCreated { .. } => EventKind::ClaimProofDataCreated,
            RegistryEvent::ClaimStatusUpdated { .. } => EventKind::ClaimStatusUpdated,
            RegistryEvent::ClaimVerifierUpdated { .. } => EventKind::ClaimVerifierUpdated,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }
}

/// A positioned event in the append-only log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    /// 1-based position, contiguous.
    pub seq: u64,

    /// Block of the call that emitted the event.
    pub block: u64,

    /// Commit time (Unix milliseconds).
    pub timestamp: i64,

    /// Id of the previous entry; `None` only for seq 1.
    pub prev: Option<EventId>,

    pub event: RegistryEvent,
}

impl LogEntry {
    /// Compute the content-addressed id of this entry. Fails only if the
    /// entry cannot be encoded.
    pub fn compute_id(&self) -> Result<EventId> {
        entry_id(self)
    }

    pub fn kind(&self) -> EventKind {
        self.event.kind()
    }
}

/// Filter for querying the event log. All bounds are inclusive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    pub kinds: Option<Vec<EventKind>>,
    pub from_block: Option<u64>,
    pub to_block: Option<u64>,
    pub from_time: Option<i64>,
    pub to_time: Option<i64>,
}

impl EventFilter {
    /// Match everything.
    pub fn all() -> Self {
        Self::default()
    }

    /// Match a single event kind.
    pub fn kind(kind: EventKind) -> Self {
        Self {
            kinds: Some(vec![kind]),
            ..Self::default()
        }
    }

    pub fn blocks(mut self, from: u64, to: u64) -> Self {
        self.from_block = Some(from);
        self.to_block = Some(to);
        self
    }

    pub fn since_block(mut self, from: u64) -> Self {
        self.from_block = Some(from);
        self
    }

    pub fn between(mut self, from_time: i64, to_time: i64) -> Self {
        self.from_time = Some(from_time);
        self.to_time = Some(to_time);
        self
    }

    pub fn matches(&self, entry: &LogEntry) -> bool {
        if let Some(kinds) = &self.kinds {
            if !kinds.contains(&entry.kind()) {
                return false;
            }
        }
        if self.from_block.is_some_and(|b| entry.block < b) {
            return false;
        }
        if self.to_block.is_some_and(|b| entry.block > b) {
            return false;
        }
        if self.from_time.is_some_and(|t| entry.timestamp < t) {
            return false;
        }
        if self.to_time.is_some_and(|t| entry.timestamp > t) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(block: u64, timestamp: i64, event: RegistryEvent) -> LogEntry {
        LogEntry {
            seq: 1,
            block,
            timestamp,
            prev: None,
            event,
        }
    }

    fn create(id: u64) -> RegistryEvent {
        RegistryEvent::CreateClaim {
            claim_id: ClaimId(id),
            creator: Address::from_bytes([1; 20]),
        }
    }

    #[test]
    fn test_kind_names_roundtrip() {
        for kind in EventKind::ALL {
            assert_eq!(EventKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(EventKind::from_name("Transfer"), None);
    }

    #[test]
    fn test_event_kind() {
        let event = RegistryEvent::ClaimStatusUpdated {
            claim_id: "claim-1".into(),
            modifier: Address::from_bytes([2; 20]),
            claim_status: "Inactive".into(),
        };
        assert_eq!(event.kind(), EventKind::ClaimStatusUpdated);
        assert_eq!(event.name(), "ClaimStatusUpdated");
    }

    #[test]
    fn test_filter_by_kind() {
        let e = entry(1, 100, create(1));
        assert!(EventFilter::all().matches(&e));
        assert!(EventFilter::kind(EventKind::CreateClaim).matches(&e));
        assert!(!EventFilter::kind(EventKind::RetrieveClaim).matches(&e));
    }

    #[test]
    fn test_filter_by_block_and_time() {
        let e = entry(5, 1_000, create(1));
        assert!(EventFilter::all().blocks(5, 5).matches(&e));
        assert!(!EventFilter::all().blocks(1, 4).matches(&e));
        assert!(!EventFilter::all().since_block(6).matches(&e));
        assert!(EventFilter::all().between(1_000, 2_000).matches(&e));
        assert!(!EventFilter::all().between(1_001, 2_000).matches(&e));
        assert!(!EventFilter::all().between(0, 999).matches(&e));
    }
}
