//! # Claims Book
//!
//! A permissioned claims registry: an access-controlled ledger of custody
//! claims and claim book records, plus a relay for token events, with every
//! successful call recorded in an append-only event log.
//!
//! ## Overview
//!
//! - **Access control**: one owner, change-agent and event-reporter roles, and
//!   a permission bitmask per identity
//! - **Claims**: created once and retrieved at most once, by change agents
//! - **Claim book records**: created once, with optional proof data and
//!   mutable status and verifier, gated by permission bits
//! - **Relay**: validated token transfer and split events from event reporters
//! - **Event log**: ordered, hash-linked, filterable by kind, block and time
//!
//! Every operation takes the caller identity explicitly.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use claimsbook::{ClaimId, Genesis, Registry, RegistryConfig};
//! use claimsbook::store::SqliteStore;
//! use claimsbook::core::Address;
//!
//! async fn example() {
//!     let owner = Address::from_bytes([1; 20]);
//!     let agent = Address::from_bytes([2; 20]);
//!
//!     let store = SqliteStore::open("claimsbook.db").unwrap();
//!     let genesis = Genesis::new(owner).with_change_agent(agent);
//!     let registry = Registry::open(store, genesis, RegistryConfig::default())
//!         .await
//!         .unwrap();
//!
//!     let outcome = registry
//!         .create_claim(&agent, ClaimId::new(1), 1, vec![0x12, 0x34])
//!         .await
//!         .unwrap();
//!     assert_eq!(outcome.entry.unwrap().seq, 1);
//! }
//! ```
//!
//! ## Re-exports
//!
//! - `claimsbook::core` - Identities, claims, records, events
//! - `claimsbook::perms` - Roles and permission bits
//! - `claimsbook::store` - Storage abstraction and SQLite

pub mod book;
pub mod claims_book;
pub mod config;
pub mod error;
pub mod ledger;
pub mod log;
pub mod registry;
pub mod relay;
pub mod state;

// Re-export component crates
pub use claimsbook_core as core;
pub use claimsbook_perms as perms;
pub use claimsbook_store as store;

// Re-export main types for convenience
pub use book::ClaimBookRegistry;
pub use claims_book::ClaimsBook;
pub use config::{Genesis, RegistryConfig};
pub use error::{RegistryError, Result};
pub use ledger::ClaimLedger;
pub use log::EventLog;
pub use registry::{Registry, TxOutcome};
pub use relay::EventRelay;
pub use state::StateValue;

pub use claimsbook_core::{
    Address, Claim, ClaimBookRecord, ClaimBookRecordProof, ClaimId, ClaimState, ErrorKind,
    EventFilter, EventId, EventKind, LogEntry, RegistryEvent,
};
pub use claimsbook_perms::{Permission, PermissionMask, Role};
