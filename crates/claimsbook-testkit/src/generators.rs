//! Proptest generators for property-based testing.
//!
//! Identities and ids are drawn from small pools so that generated call
//! sequences hit duplicates, missing ids and role collisions often.

use proptest::prelude::*;

use claimsbook_core::{Address, ClaimBookRecord, ClaimBookRecordProof, ClaimId};
use claimsbook_perms::PermissionMask;

use crate::fixtures::address;
use crate::ops::Op;

/// Any address, including zero.
pub fn any_address() -> impl Strategy<Value = Address> {
    any::<[u8; 20]>().prop_map(Address::from_bytes)
}

/// One of `address(0)..=address(5)`; zero included.
pub fn pool_address() -> impl Strategy<Value = Address> {
    (0u8..=5).prop_map(address)
}

/// A claim id in `0..=4`.
pub fn claim_id() -> impl Strategy<Value = ClaimId> {
    (0u64..=4).prop_map(ClaimId)
}

/// A record id, sometimes empty.
pub fn record_id() -> impl Strategy<Value = String> {
    prop_oneof![Just(String::new()), "[A-C]".prop_map(String::from)]
}

/// A mask over the low five bits, so the unassigned bit shows up too.
pub fn permission_mask() -> impl Strategy<Value = PermissionMask> {
    (0u32..32).prop_map(PermissionMask::from_bits)
}

pub fn metadata() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..=16)
}

pub fn record() -> impl Strategy<Value = ClaimBookRecord> {
    (
        "[a-z]{0,6}",
        "[a-z]{1,6}",
        "(Active|Inactive|Closed)",
        "[a-z0-9-]{1,8}",
        "v[0-9]",
    )
        .prop_map(
            |(parent, claim_type, status, claimant, verifier)| ClaimBookRecord {
                parent_claim_id: parent,
                claim_type,
                claim_status: status,
                claimant_id: claimant,
                claim_verifier_id: verifier,
            },
        )
}

pub fn proof() -> impl Strategy<Value = ClaimBookRecordProof> {
    ("[a-z]{1,6}", "[a-z0-9]{1,8}", "[a-z,]{0,12}").prop_map(|(vault, id, keys)| {
        ClaimBookRecordProof {
            proof_vault_provider_id: vault,
            proof_id: id,
            proof_data_keys: keys,
        }
    })
}

/// Any call, with arguments from the pools.
pub fn op() -> impl Strategy<Value = Op> {
    prop_oneof![admin_op(), claim_op(), record_op(), relay_op()]
}

pub fn admin_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (pool_address(), any::<bool>())
            .prop_map(|(addr, status)| Op::UpdateChangeAgent { addr, status }),
        (pool_address(), any::<bool>())
            .prop_map(|(addr, status)| Op::UpdateEventReporter { addr, status }),
        (pool_address(), permission_mask())
            .prop_map(|(addr, mask)| Op::SetPermission { addr, mask }),
    ]
}

pub fn claim_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (claim_id(), 0u64..=3, metadata()).prop_map(|(claim_id, claim_type, metadata)| {
            Op::CreateClaim {
                claim_id,
                claim_type,
                metadata,
            }
        }),
        (claim_id(), metadata())
            .prop_map(|(claim_id, metadata)| Op::RetrieveClaim { claim_id, metadata }),
    ]
}

pub fn record_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (record_id(), record()).prop_map(|(claim_id, record)| Op::CreateRecord { claim_id, record }),
        (record_id(), proof()).prop_map(|(claim_id, proof)| Op::CreateProof { claim_id, proof }),
        (record_id(), "(Active|Inactive|Closed)").prop_map(|(claim_id, claim_status)| {
            Op::UpdateStatus {
                claim_id,
                claim_status,
            }
        }),
        (record_id(), "v[0-9]").prop_map(|(claim_id, claim_verifier_id)| Op::UpdateVerifier {
            claim_id,
            claim_verifier_id,
        }),
    ]
}

pub fn relay_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (
            pool_address(),
            pool_address(),
            pool_address(),
            pool_address(),
            0u128..=3,
        )
            .prop_map(|(from, to, fungible_token, nft_base, amount)| {
                Op::FungibleTransfer {
                    from,
                    to,
                    fungible_token,
                    nft_base,
                    amount,
                }
            }),
        (pool_address(), pool_address(), 0u64..=3, 0u64..=3).prop_map(
            |(token_owner, nft_base, obligature_id, marketplace_id)| Op::NonFungibleSplit {
                token_owner,
                nft_base,
                obligature_id,
                marketplace_id,
            }
        ),
    ]
}

/// A caller and the call it makes.
pub fn call() -> impl Strategy<Value = (Address, Op)> {
    (pool_address(), op())
}

/// A sequence of calls.
pub fn calls(max_len: usize) -> impl Strategy<Value = Vec<(Address, Op)>> {
    prop::collection::vec(call(), 0..=max_len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::seeded_book;
    use claimsbook::EventLog;
    use claimsbook_core::ErrorKind;
    use claimsbook_perms::Permission;

    /// Run `calls` against a fresh seeded book, returning the book, the log and
    /// the number of calls that succeeded.
    fn replay(calls: &[(Address, Op)]) -> (claimsbook::ClaimsBook, EventLog, u64) {
        let mut book = seeded_book();
        let mut log = EventLog::new();
        let mut block = 0u64;
        for (caller, op) in calls {
            if let Ok(event) = op.apply(&mut book, caller) {
                block += 1;
                if let Some(event) = event {
                    log.append(event, block, block as i64).unwrap();
                }
            }
        }
        (book, log, block)
    }

    proptest! {
        #[test]
        fn test_rejected_call_changes_nothing(history in calls(12), (caller, op) in call()) {
            let (mut book, _, _) = replay(&history);
            let before = book.clone();

            if op.apply(&mut book, &caller).is_err() {
                prop_assert_eq!(book, before);
            }
        }

        #[test]
        fn test_success_emits_the_matching_event(history in calls(12), (caller, op) in call()) {
            let (mut book, _, _) = replay(&history);

            if let Ok(event) = op.apply(&mut book, &caller) {
                prop_assert_eq!(event.map(|e| e.kind()), op.event_kind());
            }
        }

        #[test]
        fn test_log_stays_contiguous(history in calls(40)) {
            let (_, log, blocks) = replay(&history);

            prop_assert!(log.verify().is_ok());
            prop_assert!(log.len() as u64 <= blocks);
            for (i, entry) in log.entries().iter().enumerate() {
                prop_assert_eq!(entry.seq, i as u64 + 1);
            }
        }

        #[test]
        fn test_claims_retrieve_at_most_once(history in calls(40)) {
            let mut book = seeded_book();
            let mut retrieved = std::collections::BTreeSet::new();

            for (caller, op) in &history {
                if let (Op::RetrieveClaim { claim_id, .. }, Ok(_)) = (op, op.apply(&mut book, caller)) {
                    prop_assert!(retrieved.insert(*claim_id));
                }
            }
            for claim_id in retrieved {
                prop_assert!(!book.claim_period_status(claim_id));
            }
        }

        #[test]
        fn test_record_creation_follows_create_bit(mask in permission_mask(), record in record()) {
            let mut book = seeded_book();
            let caller = address(4);
            book.set_permission(&address(1), caller, mask).unwrap_or_default();

            let result = book.create_claim_book_record(&caller, "X", record);
            if mask.contains(Permission::Create) {
                prop_assert!(result.is_ok());
            } else {
                prop_assert_eq!(result.unwrap_err().kind(), ErrorKind::Unauthorized);
            }
        }

        #[test]
        fn test_op_json_roundtrip(op in op()) {
            let json = serde_json::to_string(&op).unwrap();
            let back: Op = serde_json::from_str(&json).unwrap();
            prop_assert_eq!(back, op);
        }
    }
}
