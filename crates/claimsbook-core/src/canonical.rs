//! CBOR encoding of log entries and state values.
//!
//! Values are encoded with plain serde over ciborium, which is deterministic
//! but not canonical CBOR: struct fields serialize in declaration order and
//! maps in iteration order. Entry ids stay stable only while the field order
//! and types of [`LogEntry`] and [`RegistryEvent`](crate::RegistryEvent) stay
//! the same; reordering a field changes every id.

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::event::LogEntry;
use crate::types::EventId;

/// Domain separator mixed into every entry id.
pub const ENTRY_ID_DOMAIN: &[u8] = b"claimsbook/log-entry/v1";

/// Encode any serializable value as CBOR.
pub fn to_cbor<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(value, &mut buf).map_err(|e| CoreError::Encoding(e.to_string()))?;
    Ok(buf)
}

/// Decode a CBOR value.
pub fn from_cbor<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    ciborium::from_reader(bytes).map_err(|e| CoreError::Decoding(e.to_string()))
}

/// Encoded bytes of a log entry; the input to [`entry_id`].
pub fn entry_bytes(entry: &LogEntry) -> Result<Vec<u8>> {
    to_cbor(entry)
}

/// Compute `Blake3(ENTRY_ID_DOMAIN || entry bytes)`.
pub fn entry_id(entry: &LogEntry) -> Result<EventId> {
    let body = entry_bytes(entry)?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(ENTRY_ID_DOMAIN);
    hasher.update(&body);
    Ok(EventId(*hasher.finalize().as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RegistryEvent;
    use crate::types::{Address, ClaimId};

    fn sample(seq: u64) -> LogEntry {
        LogEntry {
            seq,
            block: seq,
            timestamp: 1_736_870_400_000,
            prev: None,
            event: RegistryEvent::CreateClaim {
                claim_id: ClaimId(seq),
                creator: Address::from_bytes([0x42; 20]),
            },
        }
    }

    #[test]
    fn test_entry_id_deterministic() {
        assert_eq!(sample(1).compute_id().unwrap(), sample(1).compute_id().unwrap());
        assert_ne!(sample(1).compute_id().unwrap(), sample(2).compute_id().unwrap());
        assert_eq!(entry_bytes(&sample(1)).unwrap(), entry_bytes(&sample(1)).unwrap());
    }

    #[test]
    fn test_entry_id_covers_every_field() {
        let base = sample(1);

        let mut other = base.clone();
        other.timestamp += 1;
        assert_ne!(base.compute_id().unwrap(), other.compute_id().unwrap());

        let mut other = base.clone();
        other.prev = Some(EventId([1; 32]));
        assert_ne!(base.compute_id().unwrap(), other.compute_id().unwrap());

        let mut other = base.clone();
        other.event = RegistryEvent::RetrieveClaim {
            claim_id: ClaimId(1),
            retriever: Address::from_bytes([0x42; 20]),
        };
        assert_ne!(base.compute_id().unwrap(), other.compute_id().unwrap());
    }

    #[test]
    fn test_entry_id_is_domain_separated() {
        let entry = sample(1);
        let plain = blake3::hash(&entry_bytes(&entry).unwrap());
        assert_ne!(entry.compute_id().unwrap().as_bytes(), plain.as_bytes());
        assert_eq!(entry_id(&entry).unwrap(), entry.compute_id().unwrap());
    }

    #[test]
    fn test_large_amount_survives_encoding() {
        let mut entry = sample(1);
        entry.event = RegistryEvent::FungibleTransfer {
            from: Address::from_bytes([1; 20]),
            to: Address::from_bytes([2; 20]),
            fungible_token: Address::from_bytes([3; 20]),
            nft_base: Address::from_bytes([4; 20]),
            amount: u128::MAX,
        };
        let bytes = entry_bytes(&entry).unwrap();
        let decoded: LogEntry = from_cbor(&bytes).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn test_decode_garbage_fails() {
        let result: Result<LogEntry> = from_cbor(&[0xff, 0x00, 0x13]);
        assert!(matches!(result, Err(CoreError::Decoding(_))));
    }
}
