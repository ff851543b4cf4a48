//! Argument validation and event log integrity checks.

use crate::error::{ChainError, CoreError, Result};
use crate::event::LogEntry;
use crate::types::{Address, ClaimId, EventId};

/// Reject the null address.
pub fn require_address(addr: &Address, what: &str) -> Result<()> {
    if addr.is_zero() {
        return Err(CoreError::InvalidArgument(format!("{what} is the zero address")));
    }
    Ok(())
}

/// Reject the reserved claim id 0.
pub fn require_claim_id(id: ClaimId) -> Result<()> {
    if id.is_zero() {
        return Err(CoreError::InvalidArgument("claim id 0 is reserved".into()));
    }
    Ok(())
}

/// Reject an empty string identifier.
pub fn require_non_empty(value: &str, what: &str) -> Result<()> {
    if value.is_empty() {
        return Err(CoreError::InvalidArgument(format!("{what} is empty")));
    }
    Ok(())
}

/// Reject zero for integer fields that must be positive.
pub fn require_positive(value: u128, what: &str) -> Result<()> {
    if value == 0 {
        return Err(CoreError::InvalidArgument(format!("{what} must be positive")));
    }
    Ok(())
}

/// The id the next entry must link to.
pub fn link_id(entry: &LogEntry) -> std::result::Result<EventId, ChainError> {
    entry.compute_id().map_err(|e| ChainError::Unencodable {
        seq: entry.seq,
        reason: e.to_string(),
    })
}

/// Check that `entry` may follow `last` in a log: block and timestamp never
/// go backwards.
pub fn check_order(
    last: Option<&LogEntry>,
    entry: &LogEntry,
) -> std::result::Result<(), ChainError> {
    let Some(last) = last else {
        return Ok(());
    };
    if entry.block < last.block {
        return Err(ChainError::BlockRegression { seq: entry.seq });
    }
    if entry.timestamp < last.timestamp {
        return Err(ChainError::TimestampRegression { seq: entry.seq });
    }
    Ok(())
}

/// Verify that entries form a contiguous, correctly linked chain starting at
/// seq 1 with non-decreasing block numbers and timestamps.
pub fn verify_chain(entries: &[LogEntry]) -> std::result::Result<(), ChainError> {
    let mut prev = None;
    let mut last: Option<&LogEntry> = None;

    for (i, entry) in entries.iter().enumerate() {
        let expected = i as u64 + 1;
        if entry.seq != expected {
            return Err(ChainError::InvalidSequence {
                expected,
                got: entry.seq,
            });
        }
        if entry.prev != prev {
            return Err(ChainError::BrokenLink { seq: entry.seq });
        }
        check_order(last, entry)?;
        last = Some(entry);
        prev = Some(link_id(entry)?);
    }

    Ok(())
}
