//! Registry calls as data.
//!
//! [`Op`] describes one mutating call without its caller, so scripts and
//! generators can build call sequences and replay them against a
//! [`ClaimsBook`] or a [`Registry`].

use serde::{Deserialize, Serialize};

use claimsbook::{ClaimsBook, Registry, TxOutcome};
use claimsbook_core::{
    Address, ClaimBookRecord, ClaimBookRecordProof, ClaimId, EventKind, RegistryEvent,
};
use claimsbook_perms::PermissionMask;
use claimsbook_store::Store;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Op {
    UpdateChangeAgent {
        addr: Address,
        status: bool,
    },
    UpdateEventReporter {
        addr: Address,
        status: bool,
    },
    SetPermission {
        addr: Address,
        mask: PermissionMask,
    },
    CreateClaim {
        claim_id: ClaimId,
        claim_type: u64,
        metadata: Vec<u8>,
    },
    RetrieveClaim {
        claim_id: ClaimId,
        metadata: Vec<u8>,
    },
    CreateRecord {
        claim_id: String,
        record: ClaimBookRecord,
    },
    CreateProof {
        claim_id: String,
        proof: ClaimBookRecordProof,
    },
    UpdateStatus {
        claim_id: String,
        claim_status: String,
    },
    UpdateVerifier {
        claim_id: String,
        claim_verifier_id: String,
    },
    FungibleTransfer {
        from: Address,
        to: Address,
        fungible_token: Address,
        nft_base: Address,
        amount: u128,
    },
    NonFungibleSplit {
        token_owner: Address,
        nft_base: Address,
        obligature_id: u64,
        marketplace_id: u64,
    },
}

impl Op {
    /// Kind of the event a successful call emits; `None` for role and
    /// permission updates.
    pub fn event_kind(&self) -> Option<EventKind> {
        match self {
            Op::UpdateChangeAgent { .. }
            | Op::UpdateEventReporter { .. }
            | Op::SetPermission { .. } => None,
            Op::CreateClaim { .. } => Some(EventKind::CreateClaim),
            Op::RetrieveClaim { .. } => Some(EventKind::RetrieveClaim),
            Op::CreateRecord { .. } => Some(EventKind::ClaimCreated),
            Op::CreateProof { .. } => Some(EventKind::ClaimProofDataCreated),
            Op::UpdateStatus { .. } => Some(EventKind::ClaimStatusUpdated),
            Op::UpdateVerifier { .. } => Some(EventKind::ClaimVerifierUpdated),
            Op::FungibleTransfer { .. } => Some(EventKind::FungibleTransfer),
            Op::NonFungibleSplit { .. } => Some(EventKind::ObligatureSplit),
        }
    }

    /// Apply to an in-memory book.
    pub fn apply(
        &self,
        book: &mut ClaimsBook,
        caller: &Address,
    ) -> claimsbook_core::Result<Option<RegistryEvent>> {
        let event = match self.clone() {
            Op::UpdateChangeAgent { addr, status } => {
                book.update_change_agent(caller, addr, status)?;
                None
            }
            Op::UpdateEventReporter { addr, status } => {
                book.update_event_reporter(caller, addr, status)?;
                None
            }
            Op::SetPermission { addr, mask } => {
                book.set_permission(caller, addr, mask)?;
                None
            }
            Op::CreateClaim {
                claim_id,
                claim_type,
                metadata,
            } => Some(book.create_claim(caller, claim_id, claim_type, metadata)?),
            Op::RetrieveClaim { claim_id, metadata } => {
                Some(book.retrieve_claim(caller, claim_id, metadata)?)
            }
            Op::CreateRecord { claim_id, record } => {
                Some(book.create_claim_book_record(caller, &claim_id, record)?)
            }
            Op::CreateProof { claim_id, proof } => {
                Some(book.create_claim_book_record_proof_data(caller, &claim_id, proof)?)
            }
            Op::UpdateStatus {
                claim_id,
                claim_status,
            } => Some(book.update_claim_status(caller, &claim_id, &claim_status)?),
            Op::UpdateVerifier {
                claim_id,
                claim_verifier_id,
            } => Some(book.update_claim_verifier(caller, &claim_id, &claim_verifier_id)?),
            Op::FungibleTransfer {
                from,
                to,
                fungible_token,
                nft_base,
                amount,
            } => Some(book.emit_fungible_transfer(
                caller,
                from,
                to,
                fungible_token,
                nft_base,
                amount,
            )?),
            Op::NonFungibleSplit {
                token_owner,
                nft_base,
                obligature_id,
                marketplace_id,
            } => Some(book.emit_non_fungible_split(
                caller,
                token_owner,
                nft_base,
                obligature_id,
                marketplace_id,
            )?),
        };
        Ok(event)
    }

    /// Submit to a registry.
    pub async fn submit<S: Store>(
        &self,
        registry: &Registry<S>,
        caller: &Address,
    ) -> claimsbook::Result<TxOutcome> {
        match self.clone() {
            Op::UpdateChangeAgent { addr, status } => {
                registry.update_change_agent(caller, addr, status).await
            }
            Op::UpdateEventReporter { addr, status } => {
                registry.update_event_reporter(caller, addr, status).await
            }
            Op::SetPermission { addr, mask } => registry.set_permission(caller, addr, mask).await,
            Op::CreateClaim {
                claim_id,
                claim_type,
                metadata,
            } => {
                registry
                    .create_claim(caller, claim_id, claim_type, metadata)
                    .await
            }
            Op::RetrieveClaim { claim_id, metadata } => {
                registry.retrieve_claim(caller, claim_id, metadata).await
            }
            Op::CreateRecord { claim_id, record } => {
                registry
                    .create_claim_book_record(caller, &claim_id, record)
                    .await
            }
            Op::CreateProof { claim_id, proof } => {
                registry
                    .create_claim_book_record_proof_data(caller, &claim_id, proof)
                    .await
            }
            Op::UpdateStatus {
                claim_id,
                claim_status,
            } => {
                registry
                    .update_claim_status(caller, &claim_id, &claim_status)
                    .await
            }
            Op::UpdateVerifier {
                claim_id,
                claim_verifier_id,
            } => {
                registry
                    .update_claim_verifier(caller, &claim_id, &claim_verifier_id)
                    .await
            }
            Op::FungibleTransfer {
                from,
                to,
                fungible_token,
                nft_base,
                amount,
            } => {
                registry
                    .emit_fungible_transfer(caller, from, to, fungible_token, nft_base, amount)
                    .await
            }
            Op::NonFungibleSplit {
                token_owner,
                nft_base,
                obligature_id,
                marketplace_id,
            } => {
                registry
                    .emit_non_fungible_split(
                        caller,
                        token_owner,
                        nft_base,
                        obligature_id,
                        marketplace_id,
                    )
                    .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_shape() {
        let op = Op::SetPermission {
            addr: Address::from_bytes([0xab; 20]),
            mask: PermissionMask::from_bits(27),
        };
        let json = serde_json::to_value(&op).unwrap();
        assert_eq!(json["set_permission"]["mask"], 27);
        assert_eq!(
            json["set_permission"]["addr"],
            Address::from_bytes([0xab; 20]).to_hex()
        );

        let back: Op = serde_json::from_value(json).unwrap();
        assert_eq!(back, op);
    }
}
