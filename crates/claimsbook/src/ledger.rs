//! Custody claims.
//!
//! A claim id moves `Absent -> Created -> Retrieved` and never back. Only
//! change agents may create or retrieve.

use std::collections::BTreeMap;

use bytes::Bytes;

use claimsbook_core::validation::require_claim_id;
use claimsbook_core::{Address, Claim, ClaimId, ClaimState, CoreError, RegistryEvent, Result};
use claimsbook_perms::{AccessControl, Role};

/// Claims keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClaimLedger {
    claims: BTreeMap<ClaimId, Claim>,
}

impl ClaimLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a retrievable claim.
    pub fn create_claim(
        &mut self,
        acl: &AccessControl,
        caller: &Address,
        claim_id: ClaimId,
        claim_type: u64,
        metadata: Bytes,
    ) -> Result<RegistryEvent> {
        acl.require_role(caller, Role::ChangeAgent)?;
        require_claim_id(claim_id)?;
        if claim_type == 0 {
            return Err(CoreError::InvalidArgument("claim type 0 is reserved".into()));
        }
        if self.claims.contains_key(&claim_id) {
            return Err(CoreError::AlreadyExists(format!("claim {claim_id}")));
        }

        self.claims.insert(claim_id, Claim::new(claim_type, metadata));
        Ok(RegistryEvent::CreateClaim {
            claim_id,
            creator: *caller,
        })
    }

    /// Close the claim period of an existing claim.
    pub fn retrieve_claim(
        &mut self,
        acl: &AccessControl,
        caller: &Address,
        claim_id: ClaimId,
        metadata: Bytes,
    ) -> Result<RegistryEvent> {
        acl.require_role(caller, Role::ChangeAgent)?;
        require_claim_id(claim_id)?;
        let claim = self
            .claims
            .get_mut(&claim_id)
            .ok_or_else(|| CoreError::NotFound(format!("claim {claim_id}")))?;
        if claim.state() == ClaimState::Retrieved {
            return Err(CoreError::InvalidStateTransition(format!(
                "claim {claim_id} was already retrieved"
            )));
        }

        claim.mark_retrieved(metadata);
        Ok(RegistryEvent::RetrieveClaim {
            claim_id,
            retriever: *caller,
        })
    }

    /// Fails for the reserved id 0.
    pub fn is_claim_exists(&self, claim_id: ClaimId) -> Result<bool> {
        require_claim_id(claim_id)?;
        Ok(self.claims.contains_key(&claim_id))
    }

    /// True while the claim exists and has not been retrieved.
    pub fn claim_period_status(&self, claim_id: ClaimId) -> bool {
        self.claims.get(&claim_id).is_some_and(|c| c.retrievable)
    }

    pub fn state(&self, claim_id: ClaimId) -> ClaimState {
        self.claims
            .get(&claim_id)
            .map_or(ClaimState::Absent, Claim::state)
    }

    pub fn claim(&self, claim_id: ClaimId) -> Option<&Claim> {
        self.claims.get(&claim_id)
    }

    /// Every claim, in id order.
    pub fn iter(&self) -> impl Iterator<Item = (&ClaimId, &Claim)> {
        self.claims.iter()
    }

    /// Put or remove a claim without checks. Used to rebuild persisted state.
    pub fn restore(&mut self, claim_id: ClaimId, claim: Option<Claim>) {
        match claim {
            Some(claim) => self.claims.insert(claim_id, claim),
            None => self.claims.remove(&claim_id),
        };
    }

    pub fn len(&self) -> usize {
        self.claims.len()
    }

    pub fn is_empty(&self) -> bool {
        self.claims.is_empty()
    }
}
