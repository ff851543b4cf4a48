//! # Claims Book Store
//!
//! Storage abstraction for the Claims Book. Persists registry state as keyed
//! rows and the append-only event log behind the [`Store`] trait.
//!
//! ## Key Types
//!
//! - [`Store`] - The async trait for all storage operations
//! - [`SqliteStore`] - SQLite-based persistent storage
//! - [`MemoryStore`] - In-memory storage for tests
//! - [`Commit`] - One atomic write: changed rows plus optional log entry
//! - [`StateKey`] / [`StateWrite`] - One row of state and a change to it
//! - [`Snapshot`] - Every stored row at the last committed block
//!
//! ## Usage
//!
//! ```rust,no_run
//! use claimsbook_store::{SqliteStore, Store};
//!
//! async fn example() {
//!     // Open a SQLite database
//!     let store = SqliteStore::open("claimsbook.db").unwrap();
//!
//!     // Or use an in-memory database for testing
//!     let store = SqliteStore::open_memory().unwrap();
//!
//!     let head = store.head().await.unwrap();
//!     assert!(head.is_none());
//! }
//! ```
//!
//! ## Design Notes
//!
//! - **Atomic commits**: a call's row writes and its log entry are written
//!   together or not at all.
//! - **Per-row writes**: a commit carries only the rows the call changed, so
//!   its cost does not grow with the number of claims and records.
//! - **Append-only log**: an entry is accepted only at `head + 1` with `prev`
//!   equal to the head id. Anything else is a [`StoreError::Conflict`].

pub mod error;
pub mod memory;
pub mod migration;
pub mod sqlite;
pub mod state;
pub mod traits;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;
pub use state::{StateKey, StateWrite};
pub use traits::{check_append, Commit, Snapshot, Store};
