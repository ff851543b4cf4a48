//! Claim book records and their proof data.

use std::collections::BTreeMap;

use claimsbook_core::validation::require_non_empty;
use claimsbook_core::{
    Address, ClaimBookRecord, ClaimBookRecordProof, CoreError, RegistryEvent, Result,
};
use claimsbook_perms::{AccessControl, Permission};

/// Records and proofs keyed by record id.
///
/// A proof is stored only for an existing record, so `proofs` keys are always
/// a subset of `records` keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimBookRegistry {
    records: BTreeMap<String, ClaimBookRecord>,
    proofs: BTreeMap<String, ClaimBookRecordProof>,
}

impl ClaimBookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a record under `claim_id`. Requires CREATE.
    pub fn create_record(
        &mut self,
        acl: &AccessControl,
        caller: &Address,
        claim_id: &str,
        record: ClaimBookRecord,
    ) -> Result<RegistryEvent> {
        acl.require_permission(caller, Permission::Create)?;
        require_non_empty(claim_id, "claim id")?;
        if self.records.contains_key(claim_id) {
            return Err(CoreError::AlreadyExists(format!("claim book record {claim_id}")));
        }

        self.records.insert(claim_id.to_string(), record);
        Ok(RegistryEvent::ClaimCreated {
            claim_id: claim_id.to_string(),
            creator: *caller,
        })
    }

    /// Attach proof data to an existing record, once. Requires CREATE.
    pub fn create_proof(
        &mut self,
        acl: &AccessControl,
        caller: &Address,
        claim_id: &str,
        proof: ClaimBookRecordProof,
    ) -> Result<RegistryEvent> {
        acl.require_permission(caller, Permission::Create)?;
        require_non_empty(claim_id, "claim id")?;
        self.require_record(claim_id)?;
        if self.proofs.contains_key(claim_id) {
            return Err(CoreError::AlreadyExists(format!("proof data for {claim_id}")));
        }

        self.proofs.insert(claim_id.to_string(), proof);
        Ok(RegistryEvent::ClaimProofDataCreated {
            claim_id: claim_id.to_string(),
            creator: *caller,
        })
    }

    /// Requires MODIFY_STATUS.
    pub fn update_status(
        &mut self,
        acl: &AccessControl,
        caller: &Address,
        claim_id: &str,
        claim_status: &str,
    ) -> Result<RegistryEvent> {
        acl.require_permission(caller, Permission::ModifyStatus)?;
        require_non_empty(claim_id, "claim id")?;
        let record = self.record_mut(claim_id)?;

        record.claim_status = claim_status.to_string();
        Ok(RegistryEvent::ClaimStatusUpdated {
            claim_id: claim_id.to_string(),
            modifier: *caller,
            claim_status: claim_status.to_string(),
        })
    }

    /// Requires MODIFY_VERIFIER.
    pub fn update_verifier(
        &mut self,
        acl: &AccessControl,
        caller: &Address,
        claim_id: &str,
        claim_verifier_id: &str,
    ) -> Result<RegistryEvent> {
        acl.require_permission(caller, Permission::ModifyVerifier)?;
        require_non_empty(claim_id, "claim id")?;
        let record = self.record_mut(claim_id)?;

        record.claim_verifier_id = claim_verifier_id.to_string();
        Ok(RegistryEvent::ClaimVerifierUpdated {
            claim_id: claim_id.to_string(),
            modifier: *caller,
            claim_verifier_id: claim_verifier_id.to_string(),
        })
    }

    pub fn record(&self, claim_id: &str) -> Result<&ClaimBookRecord> {
        self.records
            .get(claim_id)
            .ok_or_else(|| CoreError::NotFound(format!("claim book record {claim_id}")))
    }

    /// Missing record and missing proof are the same error.
    pub fn proof(&self, claim_id: &str) -> Result<&ClaimBookRecordProof> {
        self.proofs
            .get(claim_id)
            .ok_or_else(|| CoreError::NotFound(format!("proof data for {claim_id}")))
    }

    pub fn records(&self) -> impl Iterator<Item = (&String, &ClaimBookRecord)> {
        self.records.iter()
    }

    pub fn proofs(&self) -> impl Iterator<Item = (&String, &ClaimBookRecordProof)> {
        self.proofs.iter()
    }

    /// Put or remove a record without checks. Removing a record drops its
    /// proof. Used to rebuild persisted state.
    pub fn restore_record(&mut self, claim_id: &str, record: Option<ClaimBookRecord>) {
        match record {
            Some(record) => {
                self.records.insert(claim_id.to_string(), record);
            }
            None => {
                self.records.remove(claim_id);
                self.proofs.remove(claim_id);
            }
        }
    }

    /// Put or remove a proof. Fails if a proof is put for a missing record.
    pub fn restore_proof(
        &mut self,
        claim_id: &str,
        proof: Option<ClaimBookRecordProof>,
    ) -> Result<()> {
        match proof {
            Some(proof) => {
                if !self.contains(claim_id) {
                    return Err(CoreError::Decoding(format!(
                        "proof data for missing record {claim_id}"
                    )));
                }
                self.proofs.insert(claim_id.to_string(), proof);
            }
            None => {
                self.proofs.remove(claim_id);
            }
        }
        Ok(())
    }

    pub fn contains(&self, claim_id: &str) -> bool {
        self.records.contains_key(claim_id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn require_record(&self, claim_id: &str) -> Result<()> {
        self.record(claim_id).map(|_| ())
    }

    fn record_mut(&mut self, claim_id: &str) -> Result<&mut ClaimBookRecord> {
        self.records
            .get_mut(claim_id)
            .ok_or_else(|| CoreError::NotFound(format!("claim book record {claim_id}")))
    }
}
