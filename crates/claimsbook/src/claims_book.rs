//! The registry aggregate.
//!
//! [`ClaimsBook`] owns every mapping: access control, claims and claim book
//! records. It is synchronous and single-threaded; callers that need
//! concurrency and persistence go through [`Registry`](crate::Registry).
//!
//! Every mutating method checks authorization first, then arguments, then
//! existence and state. An `Err` means nothing changed.
//!
//! For persistence the book is also a set of keyed rows: [`ClaimsBook::row`]
//! reads one, [`ClaimsBook::put_row`] overwrites one, and
//! [`ClaimsBook::from_rows`] rebuilds a book from all of them.

use bytes::Bytes;

use claimsbook_core::{
    Address, Claim, ClaimBookRecord, ClaimBookRecordProof, ClaimId, CoreError, RegistryEvent,
    Result,
};
use claimsbook_perms::{AccessControl, PermissionMask, Role};
use claimsbook_store::StateKey;

use crate::book::ClaimBookRegistry;
use crate::config::Genesis;
use crate::ledger::ClaimLedger;
use crate::relay::EventRelay;
use crate::state::StateValue;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsBook {
    access: AccessControl,
    claims: ClaimLedger,
    records: ClaimBookRegistry,
}

impl ClaimsBook {
    /// Build the initial state. Fails if the owner or any role member is the
    /// zero address.
    pub fn from_genesis(genesis: &Genesis) -> Result<Self> {
        genesis.validate()?;

        let mut access = AccessControl::new(genesis.owner, genesis.owner_permissions);
        for addr in &genesis.change_agents {
            access.grant_initial_role(Role::ChangeAgent, *addr);
        }
        for addr in &genesis.event_reporters {
            access.grant_initial_role(Role::EventReporter, *addr);
        }

        Ok(Self {
            access,
            claims: ClaimLedger::new(),
            records: ClaimBookRegistry::new(),
        })
    }

    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    pub fn claims(&self) -> &ClaimLedger {
        &self.claims
    }

    pub fn records(&self) -> &ClaimBookRegistry {
        &self.records
    }

    pub fn owner(&self) -> &Address {
        self.access.owner()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // State Rows
    // ─────────────────────────────────────────────────────────────────────────

    /// Current value of one row; `None` if the row is absent.
    pub fn row(&self, key: &StateKey) -> Option<StateValue> {
        match key {
            StateKey::Owner => Some(StateValue::Owner(*self.owner())),
            StateKey::ChangeAgent(addr) => self.is_change_agent(addr).then_some(StateValue::Member),
            StateKey::EventReporter(addr) => {
                self.is_event_reporter(addr).then_some(StateValue::Member)
            }
            StateKey::Permission(addr) => {
                let mask = self.permissions(addr);
                (mask != PermissionMask::NONE).then_some(StateValue::Mask(mask))
            }
            StateKey::Claim(id) => self.claims.claim(*id).cloned().map(StateValue::Claim),
            StateKey::Record(id) => self.records.record(id).ok().cloned().map(StateValue::Record),
            StateKey::Proof(id) => self.records.proof(id).ok().cloned().map(StateValue::Proof),
        }
    }

    /// Overwrite one row without any authorization or argument checks.
    ///
    /// Fails if `value` is not the kind of value `key` holds, if the owner row
    /// would be removed, or if a proof is put for a missing record.
    pub fn put_row(&mut self, key: &StateKey, value: Option<StateValue>) -> Result<()> {
        match (key, value) {
            (StateKey::Owner, Some(StateValue::Owner(owner))) if owner == *self.owner() => {}
            (StateKey::ChangeAgent(addr), None) => {
                self.access.restore_role(Role::ChangeAgent, *addr, false)
            }
            (StateKey::ChangeAgent(addr), Some(StateValue::Member)) => {
                self.access.restore_role(Role::ChangeAgent, *addr, true)
            }
            (StateKey::EventReporter(addr), None) => {
                self.access.restore_role(Role::EventReporter, *addr, false)
            }
            (StateKey::EventReporter(addr), Some(StateValue::Member)) => {
                self.access.restore_role(Role::EventReporter, *addr, true)
            }
            (StateKey::Permission(addr), None) => {
                self.access.restore_mask(*addr, PermissionMask::NONE)
            }
            (StateKey::Permission(addr), Some(StateValue::Mask(mask))) => {
                self.access.restore_mask(*addr, mask)
            }
            (StateKey::Claim(id), None) => self.claims.restore(*id, None),
            (StateKey::Claim(id), Some(StateValue::Claim(claim))) => {
                self.claims.restore(*id, Some(claim))
            }
            (StateKey::Record(id), None) => self.records.restore_record(id, None),
            (StateKey::Record(id), Some(StateValue::Record(record))) => {
                self.records.restore_record(id, Some(record))
            }
            (StateKey::Proof(id), None) => self.records.restore_proof(id, None)?,
            (StateKey::Proof(id), Some(StateValue::Proof(proof))) => {
                self.records.restore_proof(id, Some(proof))?
            }
            (key, value) => {
                return Err(CoreError::Decoding(format!(
                    "{value:?} does not fit state row {key:?}"
                )))
            }
        }
        Ok(())
    }

    /// Every present row, in key order.
    pub fn rows(&self) -> Vec<(StateKey, StateValue)> {
        let mut rows = vec![(StateKey::Owner, StateValue::Owner(*self.owner()))];
        rows.extend(
            self.access
                .role_members(Role::ChangeAgent)
                .map(|addr| (StateKey::ChangeAgent(*addr), StateValue::Member)),
        );
        rows.extend(
            self.access
                .role_members(Role::EventReporter)
                .map(|addr| (StateKey::EventReporter(*addr), StateValue::Member)),
        );
        rows.extend(
            self.access
                .masks()
                .map(|(addr, mask)| (StateKey::Permission(*addr), StateValue::Mask(*mask))),
        );
        rows.extend(
            self.claims
                .iter()
                .map(|(id, claim)| (StateKey::Claim(*id), StateValue::Claim(claim.clone()))),
        );
        rows.extend(self.records.records().map(|(id, record)| {
            (StateKey::Record(id.clone()), StateValue::Record(record.clone()))
        }));
        rows.extend(self.records.proofs().map(|(id, proof)| {
            (StateKey::Proof(id.clone()), StateValue::Proof(proof.clone()))
        }));
        rows
    }

    /// Rebuild a book from its rows. Rows may come in any order; exactly one
    /// owner row is required.
    pub fn from_rows(rows: impl IntoIterator<Item = (StateKey, StateValue)>) -> Result<Self> {
        let mut owner = None;
        let mut rest = Vec::new();
        for (key, value) in rows {
            if key != StateKey::Owner {
                rest.push((key, value));
                continue;
            }
            match value {
                StateValue::Owner(addr) if owner.is_none() => owner = Some(addr),
                value => return Err(CoreError::Decoding(format!("unexpected owner row {value:?}"))),
            }
        }
        let owner = owner.ok_or_else(|| CoreError::Decoding("no owner row".into()))?;

        // Records before proofs, so every proof finds its record.
        rest.sort_by(|a, b| a.0.cmp(&b.0));
        let mut book = Self {
            access: AccessControl::new(owner, PermissionMask::NONE),
            claims: ClaimLedger::new(),
            records: ClaimBookRegistry::new(),
        };
        for (key, value) in rest {
            book.put_row(&key, Some(value))?;
        }
        Ok(book)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Access Control
    // ─────────────────────────────────────────────────────────────────────────

    pub fn is_change_agent(&self, addr: &Address) -> bool {
        self.access.is_change_agent(addr)
    }

    pub fn is_event_reporter(&self, addr: &Address) -> bool {
        self.access.is_event_reporter(addr)
    }

    pub fn permissions(&self, addr: &Address) -> PermissionMask {
        self.access.permissions(addr)
    }

    pub fn update_change_agent(&mut self, caller: &Address, addr: Address, status: bool) -> Result<()> {
        Ok(self.access.update_change_agent(caller, addr, status)?)
    }

    pub fn update_event_reporter(
        &mut self,
        caller: &Address,
        addr: Address,
        status: bool,
    ) -> Result<()> {
        Ok(self.access.update_event_reporter(caller, addr, status)?)
    }

    pub fn set_permission(
        &mut self,
        caller: &Address,
        addr: Address,
        mask: PermissionMask,
    ) -> Result<()> {
        Ok(self.access.set_permission(caller, addr, mask)?)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Claims
    // ─────────────────────────────────────────────────────────────────────────

    pub fn create_claim(
        &mut self,
        caller: &Address,
        claim_id: ClaimId,
        claim_type: u64,
        metadata: impl Into<Bytes>,
    ) -> Result<RegistryEvent> {
        self.claims
            .create_claim(&self.access, caller, claim_id, claim_type, metadata.into())
    }

    pub fn retrieve_claim(
        &mut self,
        caller: &Address,
        claim_id: ClaimId,
        metadata: impl Into<Bytes>,
    ) -> Result<RegistryEvent> {
        self.claims
            .retrieve_claim(&self.access, caller, claim_id, metadata.into())
    }

    pub fn is_claim_exists(&self, claim_id: ClaimId) -> Result<bool> {
        self.claims.is_claim_exists(claim_id)
    }

    pub fn claim_period_status(&self, claim_id: ClaimId) -> bool {
        self.claims.claim_period_status(claim_id)
    }

    pub fn claim(&self, claim_id: ClaimId) -> Option<&Claim> {
        self.claims.claim(claim_id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Claim Book Records
    // ─────────────────────────────────────────────────────────────────────────

    pub fn create_claim_book_record(
        &mut self,
        caller: &Address,
        claim_id: &str,
        record: ClaimBookRecord,
    ) -> Result<RegistryEvent> {
        self.records
            .create_record(&self.access, caller, claim_id, record)
    }

    pub fn create_claim_book_record_proof_data(
        &mut self,
        caller: &Address,
        claim_id: &str,
        proof: ClaimBookRecordProof,
    ) -> Result<RegistryEvent> {
        self.records.create_proof(&self.access, caller, claim_id, proof)
    }

    pub fn update_claim_status(
        &mut self,
        caller: &Address,
        claim_id: &str,
        claim_status: &str,
    ) -> Result<RegistryEvent> {
        self.records
            .update_status(&self.access, caller, claim_id, claim_status)
    }

    pub fn update_claim_verifier(
        &mut self,
        caller: &Address,
        claim_id: &str,
        claim_verifier_id: &str,
    ) -> Result<RegistryEvent> {
        self.records
            .update_verifier(&self.access, caller, claim_id, claim_verifier_id)
    }

    pub fn claim_book_record_by_id(&self, claim_id: &str) -> Result<&ClaimBookRecord> {
        self.records.record(claim_id)
    }

    pub fn claim_book_record_proof_by_id(&self, claim_id: &str) -> Result<&ClaimBookRecordProof> {
        self.records.proof(claim_id)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Relay
    // ─────────────────────────────────────────────────────────────────────────

    pub fn emit_fungible_transfer(
        &self,
        caller: &Address,
        from: Address,
        to: Address,
        fungible_token: Address,
        nft_base: Address,
        amount: u128,
    ) -> Result<RegistryEvent> {
        EventRelay::fungible_transfer(
            &self.access,
            caller,
            from,
            to,
            fungible_token,
            nft_base,
            amount,
        )
    }

    pub fn emit_non_fungible_split(
        &self,
        caller: &Address,
        token_owner: Address,
        nft_base: Address,
        obligature_id: u64,
        marketplace_id: u64,
    ) -> Result<RegistryEvent> {
        EventRelay::non_fungible_split(
            &self.access,
            caller,
            token_owner,
            nft_base,
            obligature_id,
            marketplace_id,
        )
    }
}
