//! The append-only event log.
//!
//! Entries are numbered from 1 without gaps and each links to the id of the
//! one before it. A log restored from storage can be checked with
//! [`EventLog::verify`].

use claimsbook_core::{
    check_order, link_id, verify_chain, ChainError, EventFilter, EventId, LogEntry,
    RegistryEvent,
};

/// Ordered, hash-linked log of registry events.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    entries: Vec<LogEntry>,
    head_id: Option<EventId>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a log from stored entries, checking the chain.
    pub fn from_entries(entries: Vec<LogEntry>) -> Result<Self, ChainError> {
        verify_chain(&entries)?;
        Self::restore(entries)
    }

    /// Rebuild a log from stored entries without checking their links. Fails
    /// only if the last entry cannot be encoded.
    pub fn restore(entries: Vec<LogEntry>) -> Result<Self, ChainError> {
        let head_id = entries.last().map(link_id).transpose()?;
        Ok(Self { entries, head_id })
    }

    /// The entry that appending `event` would produce.
    ///
    /// A `timestamp` earlier than the head's is raised to it, so a clock step
    /// backwards never reorders the log in time.
    pub fn next_entry(&self, event: RegistryEvent, block: u64, timestamp: i64) -> LogEntry {
        let timestamp = self
            .entries
            .last()
            .map_or(timestamp, |last| timestamp.max(last.timestamp));
        LogEntry {
            seq: self.entries.len() as u64 + 1,
            block,
            timestamp,
            prev: self.head_id,
            event,
        }
    }

    /// Append an event and return the new entry.
    pub fn append(
        &mut self,
        event: RegistryEvent,
        block: u64,
        timestamp: i64,
    ) -> Result<&LogEntry, ChainError> {
        let entry = self.next_entry(event, block, timestamp);
        self.push(entry)?;
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Append an entry built elsewhere. It must extend the current head.
    pub fn push(&mut self, entry: LogEntry) -> Result<(), ChainError> {
        let expected = self.entries.len() as u64 + 1;
        if entry.seq != expected {
            return Err(ChainError::InvalidSequence {
                expected,
                got: entry.seq,
            });
        }
        if entry.prev != self.head_id {
            return Err(ChainError::BrokenLink { seq: entry.seq });
        }
        check_order(self.entries.last(), &entry)?;

        self.head_id = Some(link_id(&entry)?);
        self.entries.push(entry);
        Ok(())
    }

    /// Entries matching `filter`, in seq order.
    pub fn query<'a>(&'a self, filter: &'a EventFilter) -> impl Iterator<Item = &'a LogEntry> + 'a {
        self.entries.iter().filter(move |e| filter.matches(e))
    }

    pub fn get(&self, seq: u64) -> Option<&LogEntry> {
        let index = seq.checked_sub(1)?;
        self.entries.get(usize::try_from(index).ok()?)
    }

    pub fn head(&self) -> Option<(u64, EventId)> {
        self.head_id.map(|id| (self.entries.len() as u64, id))
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn verify(&self) -> Result<(), ChainError> {
        verify_chain(&self.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimsbook_core::{Address, ClaimId, EventKind};

    fn create(id: u64) -> RegistryEvent {
        RegistryEvent::CreateClaim {
            claim_id: ClaimId(id),
            creator: Address::from_bytes([1; 20]),
        }
    }

    fn retrieve(id: u64) -> RegistryEvent {
        RegistryEvent::RetrieveClaim {
            claim_id: ClaimId(id),
            retriever: Address::from_bytes([1; 20]),
        }
    }

    fn sample() -> EventLog {
        let mut log = EventLog::new();
        log.append(create(1), 1, 1_000).unwrap();
        log.append(create(2), 2, 2_000).unwrap();
        log.append(retrieve(1), 3, 3_000).unwrap();
        log.append(create(3), 5, 5_000).unwrap();
        log
    }

    #[test]
    fn test_append_links_entries() {
        let log = sample();
        assert_eq!(log.len(), 4);
        assert!(log.get(1).unwrap().prev.is_none());
        for seq in 2..=4 {
            let prev = log.get(seq - 1).unwrap().compute_id().unwrap();
            assert_eq!(log.get(seq).unwrap().prev, Some(prev));
        }
        let head = log.get(4).unwrap().compute_id().unwrap();
        assert_eq!(log.head(), Some((4, head)));
        assert!(log.verify().is_ok());
    }

    #[test]
    fn test_get_out_of_range() {
        let log = sample();
        assert!(log.get(0).is_none());
        assert!(log.get(5).is_none());
        assert!(EventLog::new().head().is_none());
    }

    #[test]
    fn test_query_by_kind_block_time() {
        let log = sample();

        let creates: Vec<u64> = log
            .query(&EventFilter::kind(EventKind::CreateClaim))
            .map(|e| e.seq)
            .collect();
        assert_eq!(creates, vec![1, 2, 4]);

        let filter = EventFilter::all().blocks(2, 4);
        let blocks: Vec<u64> = log.query(&filter).map(|e| e.block).collect();
        assert_eq!(blocks, vec![2, 3]);

        let filter = EventFilter::all().between(2_000, 3_000);
        assert_eq!(log.query(&filter).count(), 2);

        let filter = EventFilter::kind(EventKind::RetrieveClaim).between(0, 2_999);
        assert_eq!(log.query(&filter).count(), 0);
    }

    #[test]
    fn test_next_entry_does_not_append() {
        let log = sample();
        let next = log.next_entry(create(9), 6, 6_000);
        assert_eq!(next.seq, 5);
        assert_eq!(log.len(), 4);

        let mut log = log;
        log.push(next).unwrap();
        assert_eq!(log.len(), 5);
        assert!(log.verify().is_ok());
    }

    #[test]
    fn test_clock_step_back_is_clamped() {
        let mut log = sample();

        let entry = log.append(create(9), 6, 1_000).unwrap().clone();
        assert_eq!(entry.timestamp, 5_000);
        let entry = log.append(create(10), 7, 7_000).unwrap().clone();
        assert_eq!(entry.timestamp, 7_000);

        assert!(log.verify().is_ok());
        let filter = EventFilter::all().between(5_000, 5_000);
        let seqs: Vec<u64> = log.query(&filter).map(|e| e.seq).collect();
        assert_eq!(seqs, vec![4, 5]);
    }

    #[test]
    fn test_push_rejects_non_extending_entry() {
        let mut log = sample();

        let stale = log.get(2).unwrap().clone();
        assert_eq!(
            log.push(stale),
            Err(ChainError::InvalidSequence {
                expected: 5,
                got: 2
            })
        );

        let mut unlinked = log.next_entry(create(9), 6, 6_000);
        unlinked.prev = None;
        assert_eq!(log.push(unlinked), Err(ChainError::BrokenLink { seq: 5 }));

        let early = log.next_entry(create(9), 4, 6_000);
        assert_eq!(log.push(early), Err(ChainError::BlockRegression { seq: 5 }));

        let mut before_head = log.next_entry(create(9), 6, 6_000);
        before_head.timestamp = 4_999;
        assert_eq!(
            log.push(before_head),
            Err(ChainError::TimestampRegression { seq: 5 })
        );

        assert_eq!(log.len(), 4);
    }

    #[test]
    fn test_from_entries_checks_chain() {
        let log = sample();
        let restored = EventLog::from_entries(log.entries().to_vec()).unwrap();
        assert_eq!(restored.head(), log.head());

        let mut tampered = log.entries().to_vec();
        tampered[1].timestamp += 1;
        assert_eq!(
            EventLog::from_entries(tampered.clone()).unwrap_err(),
            ChainError::BrokenLink { seq: 3 }
        );

        // Unchecked restore accepts it; verify catches it later.
        assert!(EventLog::restore(tampered).unwrap().verify().is_err());
    }
}
