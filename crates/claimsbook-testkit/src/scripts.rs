//! Golden scripts: call sequences with the outcome each call must have.
//!
//! A script pins down observable behavior (which calls succeed, which rule a
//! rejected call breaks, which event a successful call emits) independently of
//! how the registry is stored. Scripts are plain data and can be loaded from
//! JSON.

use serde::{Deserialize, Serialize};

use claimsbook::{ClaimsBook, EventLog, Genesis};
use claimsbook_core::{Address, ClaimId, ErrorKind, EventKind};
use claimsbook_perms::PermissionMask;

use crate::fixtures::{address, proof, record};
use crate::ops::Op;

/// One call and its expected result. `expect: None` means success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub caller: Address,
    pub op: Op,
    #[serde(default)]
    pub expect: Option<ErrorKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Script {
    pub name: String,
    pub genesis: Genesis,
    pub steps: Vec<Step>,
}

/// A step whose outcome differed from the script.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mismatch {
    pub step: usize,
    pub expected: Option<ErrorKind>,
    pub actual: Option<ErrorKind>,
}

/// What running a script produced.
#[derive(Debug)]
pub struct Run {
    pub book: ClaimsBook,
    pub log: EventLog,
    pub mismatches: Vec<Mismatch>,
}

impl Run {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn event_kinds(&self) -> Vec<EventKind> {
        self.log.entries().iter().map(|e| e.kind()).collect()
    }
}

impl Script {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Apply every step to a fresh book. Each successful step consumes one
    /// block; steps that emit append to the log.
    pub fn run(&self) -> claimsbook::Result<Run> {
        let mut book = ClaimsBook::from_genesis(&self.genesis)?;
        let mut log = EventLog::new();
        let mut mismatches = Vec::new();
        let mut block = 0u64;

        for (i, step) in self.steps.iter().enumerate() {
            let actual = match step.op.apply(&mut book, &step.caller) {
                Ok(event) => {
                    block += 1;
                    if let Some(event) = event {
                        log.append(event, block, block as i64)?;
                    }
                    None
                }
                Err(err) => Some(err.kind()),
            };
            if actual != step.expect {
                mismatches.push(Mismatch {
                    step: i,
                    expected: step.expect,
                    actual,
                });
            }
        }

        Ok(Run {
            book,
            log,
            mismatches,
        })
    }
}

fn ok(caller: Address, op: Op) -> Step {
    Step {
        caller,
        op,
        expect: None,
    }
}

fn rejected(caller: Address, op: Op, kind: ErrorKind) -> Step {
    Step {
        caller,
        op,
        expect: Some(kind),
    }
}

fn create_claim(id: u64, claim_type: u64) -> Op {
    Op::CreateClaim {
        claim_id: ClaimId(id),
        claim_type,
        metadata: vec![0x12, 0x34],
    }
}

fn retrieve_claim(id: u64) -> Op {
    Op::RetrieveClaim {
        claim_id: ClaimId(id),
        metadata: vec![0x12, 0x34],
    }
}

/// All built-in scripts.
pub fn all_scripts() -> Vec<Script> {
    vec![
        change_agent_updates(),
        claim_lifecycle(),
        record_lifecycle(),
        relay_events(),
    ]
}

pub fn change_agent_updates() -> Script {
    let (owner, agent) = (address(1), address(2));
    Script {
        name: "change agent updates".into(),
        genesis: Genesis::new(owner).with_change_agent(owner),
        steps: vec![
            rejected(
                owner,
                Op::UpdateChangeAgent {
                    addr: Address::ZERO,
                    status: true,
                },
                ErrorKind::InvalidArgument,
            ),
            rejected(
                owner,
                Op::UpdateChangeAgent {
                    addr: agent,
                    status: false,
                },
                ErrorKind::NoOpRejected,
            ),
            rejected(
                agent,
                Op::UpdateChangeAgent {
                    addr: agent,
                    status: true,
                },
                ErrorKind::Unauthorized,
            ),
            ok(
                owner,
                Op::UpdateChangeAgent {
                    addr: agent,
                    status: true,
                },
            ),
            rejected(
                owner,
                Op::UpdateChangeAgent {
                    addr: agent,
                    status: true,
                },
                ErrorKind::NoOpRejected,
            ),
            ok(
                owner,
                Op::UpdateChangeAgent {
                    addr: agent,
                    status: false,
                },
            ),
        ],
    }
}

pub fn claim_lifecycle() -> Script {
    let (owner, agent, outsider) = (address(1), address(2), address(8));
    Script {
        name: "claim lifecycle".into(),
        genesis: Genesis::new(owner).with_change_agent(owner),
        steps: vec![
            ok(
                owner,
                Op::UpdateChangeAgent {
                    addr: agent,
                    status: true,
                },
            ),
            rejected(agent, create_claim(0, 1), ErrorKind::InvalidArgument),
            rejected(agent, create_claim(1, 0), ErrorKind::InvalidArgument),
            rejected(outsider, create_claim(1, 1), ErrorKind::Unauthorized),
            ok(agent, create_claim(1, 1)),
            rejected(agent, create_claim(1, 1), ErrorKind::AlreadyExists),
            rejected(outsider, retrieve_claim(1), ErrorKind::Unauthorized),
            rejected(agent, retrieve_claim(0), ErrorKind::InvalidArgument),
            rejected(agent, retrieve_claim(2), ErrorKind::NotFound),
            ok(agent, retrieve_claim(1)),
            rejected(agent, retrieve_claim(1), ErrorKind::InvalidStateTransition),
            rejected(agent, create_claim(1, 1), ErrorKind::AlreadyExists),
        ],
    }
}

pub fn record_lifecycle() -> Script {
    let (owner, a, b) = (address(1), address(5), address(6));
    let update_status = |status: &str| Op::UpdateStatus {
        claim_id: "claim-1".into(),
        claim_status: status.into(),
    };
    Script {
        name: "record lifecycle".into(),
        genesis: Genesis::new(owner),
        steps: vec![
            ok(
                owner,
                Op::SetPermission {
                    addr: a,
                    mask: PermissionMask::from_bits(27),
                },
            ),
            ok(
                owner,
                Op::SetPermission {
                    addr: b,
                    mask: PermissionMask::from_bits(8),
                },
            ),
            rejected(
                a,
                Op::CreateProof {
                    claim_id: "claim-1".into(),
                    proof: proof(),
                },
                ErrorKind::NotFound,
            ),
            rejected(
                b,
                Op::CreateRecord {
                    claim_id: "claim-1".into(),
                    record: record("Active", "v1"),
                },
                ErrorKind::Unauthorized,
            ),
            rejected(
                a,
                Op::CreateRecord {
                    claim_id: String::new(),
                    record: record("Active", "v1"),
                },
                ErrorKind::InvalidArgument,
            ),
            ok(
                a,
                Op::CreateRecord {
                    claim_id: "claim-1".into(),
                    record: record("Active", "v1"),
                },
            ),
            ok(
                a,
                Op::CreateProof {
                    claim_id: "claim-1".into(),
                    proof: proof(),
                },
            ),
            rejected(
                a,
                Op::CreateProof {
                    claim_id: "claim-1".into(),
                    proof: proof(),
                },
                ErrorKind::AlreadyExists,
            ),
            ok(b, update_status("Inactive")),
            rejected(
                b,
                Op::UpdateVerifier {
                    claim_id: "claim-1".into(),
                    claim_verifier_id: "v2".into(),
                },
                ErrorKind::Unauthorized,
            ),
            ok(
                a,
                Op::UpdateVerifier {
                    claim_id: "claim-1".into(),
                    claim_verifier_id: "v2".into(),
                },
            ),
            rejected(
                a,
                Op::UpdateStatus {
                    claim_id: "claim-2".into(),
                    claim_status: "Closed".into(),
                },
                ErrorKind::NotFound,
            ),
            rejected(
                owner,
                Op::SetPermission {
                    addr: b,
                    mask: PermissionMask::from_bits(8),
                },
                ErrorKind::NoOpRejected,
            ),
            ok(
                owner,
                Op::SetPermission {
                    addr: b,
                    mask: PermissionMask::NONE,
                },
            ),
            rejected(b, update_status("Closed"), ErrorKind::Unauthorized),
        ],
    }
}

pub fn relay_events() -> Script {
    let (owner, reporter) = (address(1), address(3));
    let transfer = |to: Address, amount: u128| Op::FungibleTransfer {
        from: address(10),
        to,
        fungible_token: address(11),
        nft_base: address(12),
        amount,
    };
    Script {
        name: "relay events".into(),
        genesis: Genesis::new(owner),
        steps: vec![
            rejected(owner, transfer(address(13), 5), ErrorKind::Unauthorized),
            ok(
                owner,
                Op::UpdateEventReporter {
                    addr: reporter,
                    status: true,
                },
            ),
            rejected(reporter, transfer(Address::ZERO, 5), ErrorKind::InvalidArgument),
            rejected(reporter, transfer(address(13), 0), ErrorKind::InvalidArgument),
            ok(reporter, transfer(address(13), u128::MAX)),
            ok(
                reporter,
                Op::NonFungibleSplit {
                    token_owner: address(13),
                    nft_base: address(12),
                    obligature_id: 0,
                    marketplace_id: 0,
                },
            ),
            rejected(
                reporter,
                Op::NonFungibleSplit {
                    token_owner: address(13),
                    nft_base: Address::ZERO,
                    obligature_id: 1,
                    marketplace_id: 1,
                },
                ErrorKind::InvalidArgument,
            ),
        ],
    }
}

/// Run every built-in script; returns each name with whether it passed.
pub fn verify_all_scripts() -> Vec<(String, bool)> {
    all_scripts()
        .into_iter()
        .map(|script| {
            let passed = script.run().map(|run| run.passed()).unwrap_or(false);
            (script.name, passed)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestFixture;
    use claimsbook::{EventFilter, Registry, RegistryConfig};
    use claimsbook_store::SqliteStore;

    #[test]
    fn test_all_scripts_pass() {
        for (name, passed) in verify_all_scripts() {
            assert!(passed, "script failed: {name}");
        }
    }

    #[test]
    fn test_claim_lifecycle_state() {
        let run = claim_lifecycle().run().unwrap();
        assert!(run.passed(), "{:?}", run.mismatches);
        assert!(run.book.is_claim_exists(ClaimId(1)).unwrap());
        assert!(!run.book.claim_period_status(ClaimId(1)));
        assert_eq!(
            run.event_kinds(),
            vec![EventKind::CreateClaim, EventKind::RetrieveClaim]
        );
    }

    #[test]
    fn test_record_lifecycle_events() {
        let run = record_lifecycle().run().unwrap();
        assert!(run.passed(), "{:?}", run.mismatches);
        assert_eq!(
            run.event_kinds(),
            vec![
                EventKind::ClaimCreated,
                EventKind::ClaimProofDataCreated,
                EventKind::ClaimStatusUpdated,
                EventKind::ClaimVerifierUpdated,
            ]
        );

        let stored = run.book.claim_book_record_by_id("claim-1").unwrap();
        assert_eq!(stored.claim_status, "Inactive");
        assert_eq!(stored.claim_verifier_id, "v2");
    }

    #[test]
    fn test_mismatch_is_reported() {
        let mut script = claim_lifecycle();
        script.steps[4].expect = Some(ErrorKind::AlreadyExists);

        let run = script.run().unwrap();
        assert_eq!(
            run.mismatches,
            vec![Mismatch {
                step: 4,
                expected: Some(ErrorKind::AlreadyExists),
                actual: None,
            }]
        );
    }

    #[test]
    fn test_json_roundtrip() {
        for script in all_scripts() {
            let json = script.to_json().unwrap();
            assert_eq!(Script::from_json(&json).unwrap(), script);
        }
    }

    #[test]
    fn test_rejects_bad_genesis() {
        let mut script = relay_events();
        script.genesis = Genesis::new(Address::ZERO);
        assert_eq!(
            script.run().unwrap_err().kind(),
            Some(ErrorKind::InvalidArgument)
        );
    }

    /// The registry agrees with the in-memory replay step for step, and the
    /// rows it committed rebuild the same book.
    #[tokio::test]
    async fn test_registry_matches_scripts() {
        for script in all_scripts() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("script.db");
            let store = SqliteStore::open(&path).unwrap();
            let registry = Registry::open(store, script.genesis.clone(), RegistryConfig::default())
                .await
                .unwrap();

            for (i, step) in script.steps.iter().enumerate() {
                let actual = step
                    .op
                    .submit(&registry, &step.caller)
                    .await
                    .err()
                    .and_then(|e| e.kind());
                assert_eq!(actual, step.expect, "{} step {i}", script.name);
            }

            let run = script.run().unwrap();
            let events: Vec<_> = registry
                .events(&EventFilter::all())
                .await
                .unwrap()
                .into_iter()
                .map(|e| e.event)
                .collect();
            let expected: Vec<_> = run.log.entries().iter().map(|e| e.event.clone()).collect();
            assert_eq!(events, expected, "{}", script.name);
            assert_eq!(registry.snapshot().await, run.book, "{}", script.name);
            drop(registry);

            let reopened = Registry::open(
                SqliteStore::open(&path).unwrap(),
                script.genesis.clone(),
                RegistryConfig::default(),
            )
            .await
            .unwrap();
            assert_eq!(reopened.snapshot().await, run.book, "{}", script.name);
        }
    }

    #[tokio::test]
    async fn test_fixture_runs_ops() {
        let fixture = TestFixture::new().await;
        let out = create_claim(3, 2)
            .submit(&fixture.registry, &fixture.agent)
            .await
            .unwrap();
        assert_eq!(out.entry.unwrap().kind(), EventKind::CreateClaim);
    }
}
