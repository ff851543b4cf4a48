//! Test fixtures and helpers.
//!
//! Common setup code for integration tests.

use claimsbook::{ClaimsBook, Genesis, Registry, RegistryConfig};
use claimsbook_core::{Address, ClaimBookRecord, ClaimBookRecordProof};
use claimsbook_store::MemoryStore;

/// An address with every byte set to `n`. `address(0)` is the zero address.
pub fn address(n: u8) -> Address {
    Address::from_bytes([n; 20])
}

/// A random non-zero address.
pub fn random_address() -> Address {
    loop {
        let addr = Address::from_bytes(rand::random());
        if !addr.is_zero() {
            return addr;
        }
    }
}

/// A record with the given status and verifier.
pub fn record(claim_status: &str, claim_verifier_id: &str) -> ClaimBookRecord {
    ClaimBookRecord {
        parent_claim_id: String::new(),
        claim_type: "custody".into(),
        claim_status: claim_status.into(),
        claimant_id: "claimant-1".into(),
        claim_verifier_id: claim_verifier_id.into(),
    }
}

pub fn proof() -> ClaimBookRecordProof {
    ClaimBookRecordProof {
        proof_vault_provider_id: "vault-1".into(),
        proof_id: "proof-1".into(),
        proof_data_keys: "doc-a,doc-b".into(),
    }
}

/// A registry over a memory store with one identity per role.
///
/// The owner is also a change agent; the reporter holds no permission bits.
pub struct TestFixture {
    pub owner: Address,
    pub agent: Address,
    pub reporter: Address,
    pub registry: Registry<MemoryStore>,
}

impl TestFixture {
    /// Fixed identities: owner `address(1)`, agent `address(2)`, reporter
    /// `address(3)`.
    pub async fn new() -> Self {
        Self::with_identities(address(1), address(2), address(3)).await
    }

    /// Fresh random identities.
    pub async fn random() -> Self {
        Self::with_identities(random_address(), random_address(), random_address()).await
    }

    async fn with_identities(owner: Address, agent: Address, reporter: Address) -> Self {
        let registry = Registry::open(
            MemoryStore::new(),
            genesis(owner, agent, reporter),
            RegistryConfig::default(),
        )
        .await
        .unwrap_or_else(|e| panic!("fixture registry failed to open: {e}"));

        Self {
            owner,
            agent,
            reporter,
            registry,
        }
    }
}

/// Owner as change agent alongside `agent`, and `reporter` as event reporter.
pub fn genesis(owner: Address, agent: Address, reporter: Address) -> Genesis {
    Genesis::new(owner)
        .with_change_agent(owner)
        .with_change_agent(agent)
        .with_event_reporter(reporter)
}

/// The book a fixed-identity [`TestFixture`] starts from.
pub fn seeded_book() -> ClaimsBook {
    ClaimsBook::from_genesis(&genesis(address(1), address(2), address(3)))
        .unwrap_or_else(|e| panic!("seed genesis rejected: {e}"))
}
