//! Store trait: the abstract interface for registry persistence.
//!
//! The registry keeps its full state in memory and persists two things: keyed
//! state rows and the append-only event log. A call's changed rows and its log
//! entry move together in a single [`Commit`].

use std::collections::BTreeMap;

use async_trait::async_trait;
use claimsbook_core::{EventFilter, EventId, LogEntry};

use crate::error::{Result, StoreError};
use crate::state::{StateKey, StateWrite};

/// The last committed registry state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// Block height of the last commit.
    pub block: u64,

    /// Every stored row.
    pub rows: BTreeMap<StateKey, Vec<u8>>,
}

/// One atomic write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub block: u64,

    /// Rows the call changed. Untouched rows are left as stored.
    pub writes: Vec<StateWrite>,

    /// The entry the call emitted, if any. Role and permission updates commit
    /// without one.
    pub entry: Option<LogEntry>,
}

/// The Store trait: async interface for registry persistence.
///
/// All methods are async to support both sync (SQLite) and async backends.
/// For SQLite, `spawn_blocking` keeps the runtime free.
#[async_trait]
pub trait Store: Send + Sync {
    // ─────────────────────────────────────────────────────────────────────────
    // Writes
    // ─────────────────────────────────────────────────────────────────────────

    /// Apply the row writes and append the entry atomically.
    ///
    /// Fails with [`StoreError::Conflict`] if the block does not advance past
    /// the stored block or the entry does not extend the stored log.
    async fn commit(&self, commit: Commit) -> Result<()>;

    // ─────────────────────────────────────────────────────────────────────────
    // Reads
    // ─────────────────────────────────────────────────────────────────────────

    /// Block height and every row; `None` before the first commit.
    async fn load_snapshot(&self) -> Result<Option<Snapshot>>;

    /// Get a log entry by its 1-based position.
    async fn get_entry(&self, seq: u64) -> Result<Option<LogEntry>>;

    /// Entries matching `filter`, ordered by seq.
    async fn query_entries(&self, filter: &EventFilter) -> Result<Vec<LogEntry>>;

    /// Seq and id of the last entry.
    async fn head(&self) -> Result<Option<(u64, EventId)>>;

    async fn entry_count(&self) -> Result<u64>;
}

/// Validate a commit against the stored block height and log head.
///
/// Shared by every backend so they reject exactly the same commits.
pub fn check_append(
    stored_block: Option<u64>,
    head: Option<(u64, EventId)>,
    commit: &Commit,
) -> Result<()> {
    if let Some(stored) = stored_block {
        if commit.block <= stored {
            return Err(StoreError::Conflict(format!(
                "block {} does not advance past {}",
                commit.block, stored
            )));
        }
    }

    let Some(entry) = &commit.entry else {
        return Ok(());
    };

    let (expected_seq, expected_prev) = match head {
        Some((seq, id)) => (seq + 1, Some(id)),
        None => (1, None),
    };
    if entry.seq != expected_seq {
        return Err(StoreError::Conflict(format!(
            "entry seq {} is not the next position {}",
            entry.seq, expected_seq
        )));
    }
    if entry.prev != expected_prev {
        return Err(StoreError::Conflict(format!(
            "entry {} does not link to the log head",
            entry.seq
        )));
    }
    if entry.block != commit.block {
        return Err(StoreError::Conflict(format!(
            "entry block {} differs from commit block {}",
            entry.block, commit.block
        )));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod test_support {
    use claimsbook_core::{Address, ClaimId, LogEntry, RegistryEvent};

    use super::Commit;
    use crate::state::{StateKey, StateWrite};

    /// The owner row, tagged with the block that wrote it.
    pub fn owner_write(block: u64) -> StateWrite {
        StateWrite::put(StateKey::Owner, format!("state@{block}").into_bytes())
    }

    /// A commit at `block` whose entry extends a log currently ending at
    /// `prev` (seq `block - 1`).
    pub fn commit_with_entry(block: u64, prev: Option<&LogEntry>) -> Commit {
        let entry = LogEntry {
            seq: prev.map_or(1, |p| p.seq + 1),
            block,
            timestamp: 1_700_000_000_000 + block as i64,
            prev: prev.map(|p| p.compute_id().unwrap()),
            event: RegistryEvent::CreateClaim {
                claim_id: ClaimId(block),
                creator: Address::from_bytes([0x11; 20]),
            },
        };
        Commit {
            block,
            writes: vec![
                owner_write(block),
                StateWrite::put(StateKey::Claim(ClaimId(block)), vec![block as u8]),
            ],
            entry: Some(entry),
        }
    }

    pub fn bare_commit(block: u64) -> Commit {
        Commit {
            block,
            writes: vec![owner_write(block)],
            entry: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_first_commit_accepted() {
        assert!(check_append(None, None, &bare_commit(0)).is_ok());
        assert!(check_append(None, None, &commit_with_entry(1, None)).is_ok());
    }

    #[test]
    fn test_block_must_advance() {
        let err = check_append(Some(3), None, &bare_commit(3)).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(check_append(Some(3), None, &bare_commit(4)).is_ok());
    }

    #[test]
    fn test_entry_must_extend_head() {
        let first = commit_with_entry(1, None).entry.unwrap();
        let head = Some((1, first.compute_id().unwrap()));

        assert!(check_append(Some(1), head, &commit_with_entry(2, Some(&first))).is_ok());

        // Wrong seq.
        let err = check_append(Some(1), head, &commit_with_entry(2, None)).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));

        // Right seq, wrong link.
        let mut commit = commit_with_entry(2, Some(&first));
        if let Some(e) = commit.entry.as_mut() {
            e.prev = Some(EventId([0; 32]));
        }
        assert!(check_append(Some(1), head, &commit).is_err());
    }
}
