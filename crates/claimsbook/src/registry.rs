//! The Registry: async, persistent front end to a [`ClaimsBook`].
//!
//! All mutating calls are serialized by one write lock. Each call names the
//! state rows it may touch; the registry reads them before and after the call
//! and commits only the rows that changed, together with the log entry. A
//! rejected call changes nothing. If the commit fails, the touched rows are
//! put back, so state, log and store stay exactly as they were.

use bytes::Bytes;
use tokio::sync::{broadcast, RwLock};

use claimsbook_core::{
    Address, Claim, ClaimBookRecord, ClaimBookRecordProof, ClaimId, EventFilter, LogEntry,
    RegistryEvent,
};
use claimsbook_perms::PermissionMask;
use claimsbook_store::{Commit, Snapshot, StateKey, StateWrite, Store};

use crate::claims_book::ClaimsBook;
use crate::config::{Genesis, RegistryConfig};
use crate::error::{RegistryError, Result};
use crate::log::EventLog;
use crate::state::StateValue;

/// What a committed call produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxOutcome {
    /// Block consumed by the call.
    pub block: u64,

    /// The appended entry; `None` for role and permission updates.
    pub entry: Option<LogEntry>,
}

struct State {
    book: ClaimsBook,
    block: u64,
    log: EventLog,
}

/// A persistent claims registry.
pub struct Registry<S: Store> {
    store: S,
    config: RegistryConfig,
    state: RwLock<State>,
    events: broadcast::Sender<LogEntry>,
}

impl<S: Store> Registry<S> {
    /// Open a registry over `store`.
    ///
    /// If the store holds state it is loaded and `genesis` is ignored.
    /// Otherwise every genesis row is committed at block 0.
    pub async fn open(store: S, genesis: Genesis, config: RegistryConfig) -> Result<Self> {
        let (book, block) = match store.load_snapshot().await? {
            Some(snapshot) => {
                let block = snapshot.block;
                (load_book(snapshot)?, block)
            }
            None => {
                let book = ClaimsBook::from_genesis(&genesis)?;
                let writes = book
                    .rows()
                    .into_iter()
                    .map(|(key, value)| Ok(StateWrite::put(key, value.encode()?)))
                    .collect::<Result<Vec<_>>>()?;
                store
                    .commit(Commit {
                        block: 0,
                        writes,
                        entry: None,
                    })
                    .await?;
                tracing::info!(owner = %genesis.owner, "initialized registry from genesis");
                (book, 0)
            }
        };

        let entries = store.query_entries(&EventFilter::all()).await?;
        let log = if config.verify_log_on_open {
            EventLog::from_entries(entries).map_err(|e| {
                tracing::warn!(error = %e, "persisted event log failed verification");
                RegistryError::from(e)
            })?
        } else {
            EventLog::restore(entries)?
        };

        if let Some(last) = log.entries().last() {
            if last.block > block {
                return Err(RegistryError::Corrupted(format!(
                    "log entry {} is at block {} past stored block {}",
                    last.seq, last.block, block
                )));
            }
        }

        tracing::info!(block, entries = log.len(), "opened registry");

        let (events, _) = broadcast::channel(config.event_channel_capacity.max(1));
        Ok(Self {
            store,
            config,
            state: RwLock::new(State { book, block, log }),
            events,
        })
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Receive every entry committed from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.events.subscribe()
    }

    /// Apply `op` to the state, commit the rows in `keys` that changed, then
    /// publish. `keys` must cover every row `op` can write.
    async fn transact<F>(
        &self,
        op: &'static str,
        caller: &Address,
        keys: Vec<StateKey>,
        f: F,
    ) -> Result<TxOutcome>
    where
        F: FnOnce(&mut ClaimsBook) -> claimsbook_core::Result<Option<RegistryEvent>>,
    {
        let mut state = self.state.write().await;

        let before: Vec<Option<StateValue>> = keys.iter().map(|key| state.book.row(key)).collect();
        let event = match f(&mut state.book) {
            Ok(event) => event,
            Err(err) => {
                tracing::warn!(op, caller = %caller, error = %err, "rejected");
                return Err(err.into());
            }
        };

        let block = state.block + 1;
        let entry = event.map(|event| state.log.next_entry(event, block, now_millis()));
        let committed = match changed_rows(&state.book, &keys, &before) {
            Ok(writes) => {
                let commit = Commit {
                    block,
                    writes,
                    entry: entry.clone(),
                };
                self.store.commit(commit).await.map_err(RegistryError::from)
            }
            Err(err) => Err(err),
        };
        if let Err(err) = committed {
            tracing::warn!(op, block, error = %err, "commit failed");
            rollback(&mut state.book, &keys, before);
            return Err(err);
        }

        if let Some(entry) = &entry {
            state.log.push(entry.clone())?;
        }
        state.block = block;
        drop(state);

        tracing::debug!(op, block, seq = entry.as_ref().map(|e| e.seq), "committed");
        if let Some(entry) = &entry {
            // No receivers is not an error.
            let _ = self.events.send(entry.clone());
        }

        Ok(TxOutcome { block, entry })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Access Control
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn update_change_agent(
        &self,
        caller: &Address,
        addr: Address,
        status: bool,
    ) -> Result<TxOutcome> {
        let keys = vec![StateKey::ChangeAgent(addr)];
        self.transact("update_change_agent", caller, keys, |book| {
            book.update_change_agent(caller, addr, status).map(|()| None)
        })
        .await
    }

    pub async fn update_event_reporter(
        &self,
        caller: &Address,
        addr: Address,
        status: bool,
    ) -> Result<TxOutcome> {
        let keys = vec![StateKey::EventReporter(addr)];
        self.transact("update_event_reporter", caller, keys, |book| {
            book.update_event_reporter(caller, addr, status).map(|()| None)
        })
        .await
    }

    pub async fn set_permission(
        &self,
        caller: &Address,
        addr: Address,
        mask: PermissionMask,
    ) -> Result<TxOutcome> {
        let keys = vec![StateKey::Permission(addr)];
        self.transact("set_permission", caller, keys, |book| {
            book.set_permission(caller, addr, mask).map(|()| None)
        })
        .await
    }

    pub async fn owner(&self) -> Address {
        *self.state.read().await.book.owner()
    }

    pub async fn is_change_agent(&self, addr: &Address) -> bool {
        self.state.read().await.book.is_change_agent(addr)
    }

    pub async fn is_event_reporter(&self, addr: &Address) -> bool {
        self.state.read().await.book.is_event_reporter(addr)
    }

    pub async fn permissions(&self, addr: &Address) -> PermissionMask {
        self.state.read().await.book.permissions(addr)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Claims
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_claim(
        &self,
        caller: &Address,
        claim_id: ClaimId,
        claim_type: u64,
        metadata: impl Into<Bytes>,
    ) -> Result<TxOutcome> {
        let metadata = metadata.into();
        let keys = vec![StateKey::Claim(claim_id)];
        self.transact("create_claim", caller, keys, |book| {
            book.create_claim(caller, claim_id, claim_type, metadata)
                .map(Some)
        })
        .await
    }

    pub async fn retrieve_claim(
        &self,
        caller: &Address,
        claim_id: ClaimId,
        metadata: impl Into<Bytes>,
    ) -> Result<TxOutcome> {
        let metadata = metadata.into();
        let keys = vec![StateKey::Claim(claim_id)];
        self.transact("retrieve_claim", caller, keys, |book| {
            book.retrieve_claim(caller, claim_id, metadata).map(Some)
        })
        .await
    }

    pub async fn is_claim_exists(&self, claim_id: ClaimId) -> Result<bool> {
        Ok(self.state.read().await.book.is_claim_exists(claim_id)?)
    }

    pub async fn claim_period_status(&self, claim_id: ClaimId) -> bool {
        self.state.read().await.book.claim_period_status(claim_id)
    }

    pub async fn claim(&self, claim_id: ClaimId) -> Option<Claim> {
        self.state.read().await.book.claim(claim_id).cloned()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Claim Book Records
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn create_claim_book_record(
        &self,
        caller: &Address,
        claim_id: &str,
        record: ClaimBookRecord,
    ) -> Result<TxOutcome> {
        let keys = vec![StateKey::Record(claim_id.to_string())];
        self.transact("create_claim_book_record", caller, keys, |book| {
            book.create_claim_book_record(caller, claim_id, record)
                .map(Some)
        })
        .await
    }

    pub async fn create_claim_book_record_proof_data(
        &self,
        caller: &Address,
        claim_id: &str,
        proof: ClaimBookRecordProof,
    ) -> Result<TxOutcome> {
        let keys = vec![StateKey::Proof(claim_id.to_string())];
        self.transact("create_claim_book_record_proof_data", caller, keys, |book| {
            book.create_claim_book_record_proof_data(caller, claim_id, proof)
                .map(Some)
        })
        .await
    }

    pub async fn update_claim_status(
        &self,
        caller: &Address,
        claim_id: &str,
        claim_status: &str,
    ) -> Result<TxOutcome> {
        let keys = vec![StateKey::Record(claim_id.to_string())];
        self.transact("update_claim_status", caller, keys, |book| {
            book.update_claim_status(caller, claim_id, claim_status)
                .map(Some)
        })
        .await
    }

    pub async fn update_claim_verifier(
        &self,
        caller: &Address,
        claim_id: &str,
        claim_verifier_id: &str,
    ) -> Result<TxOutcome> {
        let keys = vec![StateKey::Record(claim_id.to_string())];
        self.transact("update_claim_verifier", caller, keys, |book| {
            book.update_claim_verifier(caller, claim_id, claim_verifier_id)
                .map(Some)
        })
        .await
    }

    pub async fn claim_book_record_by_id(&self, claim_id: &str) -> Result<ClaimBookRecord> {
        let state = self.state.read().await;
        Ok(state.book.claim_book_record_by_id(claim_id)?.clone())
    }

    pub async fn claim_book_record_proof_by_id(
        &self,
        claim_id: &str,
    ) -> Result<ClaimBookRecordProof> {
        let state = self.state.read().await;
        Ok(state.book.claim_book_record_proof_by_id(claim_id)?.clone())
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Relay
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn emit_fungible_transfer(
        &self,
        caller: &Address,
        from: Address,
        to: Address,
        fungible_token: Address,
        nft_base: Address,
        amount: u128,
    ) -> Result<TxOutcome> {
        self.transact("emit_fungible_transfer", caller, Vec::new(), |book| {
            book.emit_fungible_transfer(caller, from, to, fungible_token, nft_base, amount)
                .map(Some)
        })
        .await
    }

    pub async fn emit_non_fungible_split(
        &self,
        caller: &Address,
        token_owner: Address,
        nft_base: Address,
        obligature_id: u64,
        marketplace_id: u64,
    ) -> Result<TxOutcome> {
        self.transact("emit_non_fungible_split", caller, Vec::new(), |book| {
            book.emit_non_fungible_split(caller, token_owner, nft_base, obligature_id, marketplace_id)
                .map(Some)
        })
        .await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Event Log
    // ─────────────────────────────────────────────────────────────────────────

    /// Query the persisted log.
    pub async fn events(&self, filter: &EventFilter) -> Result<Vec<LogEntry>> {
        Ok(self.store.query_entries(filter).await?)
    }

    pub async fn entry(&self, seq: u64) -> Result<Option<LogEntry>> {
        Ok(self.store.get_entry(seq).await?)
    }

    /// Block consumed by the last committed call; 0 before any call.
    pub async fn block_height(&self) -> u64 {
        self.state.read().await.block
    }

    pub async fn entry_count(&self) -> usize {
        self.state.read().await.log.len()
    }

    /// Check the persisted log's seqs and links.
    pub async fn verify_log(&self) -> Result<()> {
        let entries = self.store.query_entries(&EventFilter::all()).await?;
        claimsbook_core::verify_chain(&entries)?;
        Ok(())
    }

    /// A copy of the current state.
    pub async fn snapshot(&self) -> ClaimsBook {
        self.state.read().await.book.clone()
    }
}

/// Decode every stored row and rebuild the book.
fn load_book(snapshot: Snapshot) -> Result<ClaimsBook> {
    let rows = snapshot
        .rows
        .into_iter()
        .map(|(key, bytes)| {
            StateValue::decode(&bytes)
                .map(|value| (key.clone(), value))
                .map_err(|e| RegistryError::Corrupted(format!("state row {key:?}: {e}")))
        })
        .collect::<Result<Vec<_>>>()?;
    ClaimsBook::from_rows(rows).map_err(|e| RegistryError::Corrupted(format!("state: {e}")))
}

/// Writes for the rows in `keys` whose value differs from `before`.
fn changed_rows(
    book: &ClaimsBook,
    keys: &[StateKey],
    before: &[Option<StateValue>],
) -> Result<Vec<StateWrite>> {
    let mut writes = Vec::new();
    for (key, old) in keys.iter().zip(before) {
        let new = book.row(key);
        if new == *old {
            continue;
        }
        writes.push(match new {
            Some(value) => StateWrite::put(key.clone(), value.encode()?),
            None => StateWrite::delete(key.clone()),
        });
    }
    Ok(writes)
}

/// Put the rows in `keys` back to `before`.
fn rollback(book: &mut ClaimsBook, keys: &[StateKey], before: Vec<Option<StateValue>>) {
    for (key, value) in keys.iter().zip(before) {
        if let Err(err) = book.put_row(key, value) {
            tracing::error!(?key, error = %err, "rollback failed");
        }
    }
}

/// Current time in milliseconds; 0 if the clock is before the epoch.
fn now_millis() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use claimsbook_core::{ErrorKind, EventKind};
    use claimsbook_store::MemoryStore;

    fn addr(n: u8) -> Address {
        Address::from_bytes([n; 20])
    }

    async fn registry() -> Registry<MemoryStore> {
        let genesis = Genesis::new(addr(1))
            .with_change_agent(addr(2))
            .with_event_reporter(addr(3));
        Registry::open(MemoryStore::new(), genesis, RegistryConfig::default())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_open_commits_genesis() {
        let registry = registry().await;
        assert_eq!(registry.block_height().await, 0);
        assert_eq!(registry.owner().await, addr(1));
        let snapshot = registry.store().load_snapshot().await.unwrap().unwrap();
        assert_eq!(snapshot.block, 0);
        let keys: Vec<_> = snapshot.rows.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                StateKey::Owner,
                StateKey::ChangeAgent(addr(2)),
                StateKey::EventReporter(addr(3)),
                StateKey::Permission(addr(1)),
            ]
        );
        assert_eq!(registry.store().entry_count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_open_rejects_bad_genesis() {
        let err = Registry::open(
            MemoryStore::new(),
            Genesis::new(Address::ZERO),
            RegistryConfig::default(),
        )
        .await
        .err()
        .unwrap();
        assert_eq!(err.kind(), Some(ErrorKind::InvalidArgument));
    }

    #[tokio::test]
    async fn test_every_success_consumes_a_block() {
        let registry = registry().await;

        let out = registry
            .update_change_agent(&addr(1), addr(4), true)
            .await
            .unwrap();
        assert_eq!(out, TxOutcome { block: 1, entry: None });

        let out = registry
            .create_claim(&addr(4), ClaimId(1), 1, vec![0x12, 0x34])
            .await
            .unwrap();
        assert_eq!(out.block, 2);
        let entry = out.entry.unwrap();
        assert_eq!(entry.seq, 1);
        assert_eq!(entry.block, 2);
        assert_eq!(entry.kind(), EventKind::CreateClaim);

        assert_eq!(registry.block_height().await, 2);
        assert_eq!(registry.entry_count().await, 1);
    }

    #[tokio::test]
    async fn test_rejection_changes_nothing() {
        let registry = registry().await;
        registry
            .create_claim(&addr(2), ClaimId(1), 1, Bytes::new())
            .await
            .unwrap();
        let before = registry.snapshot().await;

        let err = registry
            .create_claim(&addr(2), ClaimId(1), 1, Bytes::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), Some(ErrorKind::AlreadyExists));

        assert_eq!(registry.snapshot().await, before);
        assert_eq!(registry.block_height().await, 1);
        assert_eq!(registry.store().entry_count().await.unwrap(), 1);
        assert_eq!(registry.store().load_snapshot().await.unwrap().unwrap().block, 1);
    }

    #[tokio::test]
    async fn test_subscribers_see_committed_entries() {
        let registry = registry().await;
        let mut rx = registry.subscribe();

        registry
            .emit_non_fungible_split(&addr(3), addr(5), addr(6), 7, 8)
            .await
            .unwrap();
        // Rejected and event-less calls publish nothing.
        let _ = registry
            .emit_non_fungible_split(&addr(2), addr(5), addr(6), 7, 8)
            .await;
        registry
            .set_permission(&addr(1), addr(5), PermissionMask::from_bits(1))
            .await
            .unwrap();
        registry
            .emit_fungible_transfer(&addr(3), addr(5), addr(6), addr(7), addr(8), 10)
            .await
            .unwrap();

        let first = rx.recv().await.unwrap();
        assert_eq!(first.seq, 1);
        assert_eq!(first.kind(), EventKind::ObligatureSplit);
        let second = rx.recv().await.unwrap();
        assert_eq!(second.seq, 2);
        assert_eq!(second.kind(), EventKind::FungibleTransfer);
        assert_eq!(second.block, 3);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_events_query_persisted_log() {
        let registry = registry().await;
        registry
            .create_claim(&addr(2), ClaimId(1), 1, Bytes::new())
            .await
            .unwrap();
        registry
            .retrieve_claim(&addr(2), ClaimId(1), Bytes::new())
            .await
            .unwrap();

        let all = registry.events(&EventFilter::all()).await.unwrap();
        assert_eq!(all.len(), 2);
        let retrieves = registry
            .events(&EventFilter::kind(EventKind::RetrieveClaim))
            .await
            .unwrap();
        assert_eq!(retrieves.len(), 1);
        assert_eq!(registry.entry(2).await.unwrap(), Some(retrieves[0].clone()));
        registry.verify_log().await.unwrap();
    }
}
