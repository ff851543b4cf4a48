//! Claims and claim book records.
//!
//! A [`Claim`] is a time-boxed custody assertion that can be retrieved at most
//! once. A [`ClaimBookRecord`] is a permanent assertion whose status and
//! verifier can change, optionally carrying a [`ClaimBookRecordProof`].

use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// A custody claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claim {
    /// Positive claim type discriminator.
    pub claim_type: u64,

    /// Opaque metadata supplied at creation.
    pub metadata: Bytes,

    /// True while the claim period is open; false once retrieved.
    pub retrievable: bool,

    /// Metadata supplied when the claim was retrieved.
    pub retrieval_metadata: Option<Bytes>,
}

/// Lifecycle position of a claim id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClaimState {
    Absent,
    Created,
    Retrieved,
}

impl Claim {
    /// A freshly created, retrievable claim.
    pub fn new(claim_type: u64, metadata: impl Into<Bytes>) -> Self {
        Self {
            claim_type,
            metadata: metadata.into(),
            retrievable: true,
            retrieval_metadata: None,
        }
    }

    pub fn state(&self) -> ClaimState {
        if self.retrievable {
            ClaimState::Created
        } else {
            ClaimState::Retrieved
        }
    }

    /// Close the claim period. Callers check [`Claim::state`] first.
    pub fn mark_retrieved(&mut self, metadata: impl Into<Bytes>) {
        self.retrievable = false;
        self.retrieval_metadata = Some(metadata.into());
    }
}

/// A claim book record.
///
/// The record's own id is the key it is stored under and is not repeated here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimBookRecord {
    /// Id of a parent record, or empty.
    pub parent_claim_id: String,
    pub claim_type: String,
    pub claim_status: String,
    pub claimant_id: String,
    pub claim_verifier_id: String,
}

/// Provenance metadata attached to a claim book record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimBookRecordProof {
    pub proof_vault_provider_id: String,
    pub proof_id: String,
    /// Keys of the referenced documents, as supplied by the creator.
    pub proof_data_keys: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_claim_is_retrievable() {
        let claim = Claim::new(1, vec![0x12, 0x34]);
        assert!(claim.retrievable);
        assert_eq!(claim.state(), ClaimState::Created);
        assert_eq!(claim.metadata.as_ref(), &[0x12, 0x34]);
        assert!(claim.retrieval_metadata.is_none());
    }

    #[test]
    fn test_mark_retrieved() {
        let mut claim = Claim::new(1, Bytes::from_static(b"in"));
        claim.mark_retrieved(Bytes::from_static(b"out"));
        assert!(!claim.retrievable);
        assert_eq!(claim.state(), ClaimState::Retrieved);
        assert_eq!(claim.metadata.as_ref(), b"in");
        assert_eq!(claim.retrieval_metadata.as_deref(), Some(&b"out"[..]));
    }
}
