//! Row values of persisted registry state.
//!
//! A [`ClaimsBook`](crate::ClaimsBook) is stored as one row per
//! [`StateKey`](claimsbook_store::StateKey). Each row holds a CBOR-encoded
//! [`StateValue`] whose variant must match the key.

use serde::{Deserialize, Serialize};

use claimsbook_core::{
    from_cbor, to_cbor, Address, Claim, ClaimBookRecord, ClaimBookRecordProof, Result,
};
use claimsbook_perms::PermissionMask;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateValue {
    Owner(Address),

    /// Role membership; the row exists only while the address holds the role.
    Member,

    Mask(PermissionMask),
    Claim(Claim),
    Record(ClaimBookRecord),
    Proof(ClaimBookRecordProof),
}

impl StateValue {
    pub fn encode(&self) -> Result<Vec<u8>> {
        to_cbor(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        from_cbor(bytes)
    }
}
