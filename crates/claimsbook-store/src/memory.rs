//! In-memory implementation of the Store trait.
//!
//! This is primarily for testing. It has the same semantics as SQLite
//! but keeps everything in memory with no persistence.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;

use claimsbook_core::{EventFilter, EventId, LogEntry};

use crate::error::{Result, StoreError};
use crate::state::StateKey;
use crate::traits::{check_append, Commit, Snapshot, Store};

/// In-memory store implementation.
///
/// All data is lost when the store is dropped. Thread-safe via RwLock.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    /// Block of the last commit; `None` before the first.
    block: Option<u64>,

    rows: BTreeMap<StateKey, Vec<u8>>,

    /// Entries in seq order; `entries[i].seq == i + 1`.
    entries: Vec<LogEntry>,

    /// Cached id of the last entry.
    head_id: Option<EventId>,
}

impl MemoryStoreInner {
    fn head(&self) -> Option<(u64, EventId)> {
        let last = self.entries.last()?;
        self.head_id.map(|id| (last.seq, id))
    }
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, MemoryStoreInner>> {
        self.inner
            .read()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, MemoryStoreInner>> {
        self.inner
            .write()
            .map_err(|e| StoreError::Unavailable(format!("lock poisoned: {e}")))
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn commit(&self, commit: Commit) -> Result<()> {
        let mut inner = self.write()?;

        check_append(inner.block, inner.head(), &commit)?;
        let head_id = commit.entry.as_ref().map(LogEntry::compute_id).transpose()?;

        for write in commit.writes {
            match write.value {
                Some(value) => inner.rows.insert(write.key, value),
                None => inner.rows.remove(&write.key),
            };
        }
        if let Some(entry) = commit.entry {
            inner.head_id = head_id;
            inner.entries.push(entry);
        }
        inner.block = Some(commit.block);

        Ok(())
    }

    async fn load_snapshot(&self) -> Result<Option<Snapshot>> {
        let inner = self.read()?;
        Ok(inner.block.map(|block| Snapshot {
            block,
            rows: inner.rows.clone(),
        }))
    }

    async fn get_entry(&self, seq: u64) -> Result<Option<LogEntry>> {
        let Some(index) = seq.checked_sub(1).and_then(|i| usize::try_from(i).ok()) else {
            return Ok(None);
        };
        Ok(self.read()?.entries.get(index).cloned())
    }

    async fn query_entries(&self, filter: &EventFilter) -> Result<Vec<LogEntry>> {
        let inner = self.read()?;
        Ok(inner
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect())
    }

    async fn head(&self) -> Result<Option<(u64, EventId)>> {
        Ok(self.read()?.head())
    }

    async fn entry_count(&self) -> Result<u64> {
        Ok(self.read()?.entries.len() as u64)
    }
}
