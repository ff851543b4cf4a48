//! # Claims Book Core
//!
//! Pure primitives for the Claims Book: identities, claims, claim book
//! records, registry events and the canonical encoding of log entries.
//!
//! This crate contains no I/O and no storage.
//!
//! ## Key Types
//!
//! - [`Address`] - 20-byte account identity
//! - [`ClaimId`] - Positive integer id of a custody claim
//! - [`Claim`] / [`ClaimBookRecord`] / [`ClaimBookRecordProof`] - Registry state
//! - [`RegistryEvent`] / [`LogEntry`] - What the registry emits and how it is ordered
//! - [`EventId`] - Content-addressed id of a log entry (Blake3)
//!
//! ## Encoding
//!
//! Log entries and state values are encoded as CBOR. See [`canonical`].

pub mod canonical;
pub mod claim;
pub mod error;
pub mod event;
pub mod types;
pub mod validation;

pub use canonical::{entry_bytes, entry_id, from_cbor, to_cbor};
pub use claim::{Claim, ClaimBookRecord, ClaimBookRecordProof, ClaimState};
pub use error::{ChainError, CoreError, ErrorKind, Result};
pub use event::{EventFilter, EventKind, LogEntry, RegistryEvent};
pub use types::{Address, ClaimId, EventId};
pub use validation::{check_order, link_id, verify_chain};
