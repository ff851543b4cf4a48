//! # Claims Book Testkit
//!
//! Testing utilities for the Claims Book.
//!
//! ## Overview
//!
//! This crate provides:
//!
//! - **Ops**: registry calls as data, replayable against a book or a registry
//! - **Golden scripts**: call sequences with the outcome each call must have
//! - **Generators**: Proptest strategies for property-based testing
//! - **Fixtures**: Helper structs for setting up test scenarios
//!
//! ## Golden Scripts
//!
//! ```rust
//! use claimsbook_testkit::scripts::all_scripts;
//!
//! for script in all_scripts() {
//!     let run = script.run().unwrap();
//!     assert!(run.passed(), "{}: {:?}", script.name, run.mismatches);
//! }
//! ```
//!
//! ## Property Testing
//!
//! ```rust,ignore
//! use proptest::prelude::*;
//! use claimsbook_testkit::{fixtures::seeded_book, generators::call};
//!
//! proptest! {
//!     #[test]
//!     fn rejected_call_changes_nothing((caller, op) in call()) {
//!         let mut book = seeded_book();
//!         let before = book.clone();
//!         if op.apply(&mut book, &caller).is_err() {
//!             prop_assert_eq!(book, before);
//!         }
//!     }
//! }
//! ```
//!
//! ## Test Fixtures
//!
//! ```rust,no_run
//! use claimsbook_testkit::fixtures::TestFixture;
//! use claimsbook::ClaimId;
//!
//! # async fn example() {
//! let fixture = TestFixture::new().await;
//! fixture
//!     .registry
//!     .create_claim(&fixture.agent, ClaimId::new(1), 1, vec![0x12, 0x34])
//!     .await
//!     .unwrap();
//! # }
//! ```

pub mod fixtures;
pub mod generators;
pub mod ops;
pub mod scripts;

pub use fixtures::{address, seeded_book, TestFixture};
pub use ops::Op;
pub use scripts::{all_scripts, verify_all_scripts, Script, Step};
