//! # triage-core — Foundational Types for the Triage Stack
//!
//! This crate is the leaf of the triage workspace. It defines the value
//! types every other crate exchanges: the ordered severity scale, the
//! closed-category clinical features, the fact set that the rule engine
//! and the posterior estimator both read, and the normalizer that turns
//! raw vital signs into facts.
//!
//! ## Key Design Principles
//!
//! 1. **Single `SeverityLevel` enum.** One definition, four variants, with
//!    a derived total order. Queue priority, floor comparison, and hard
//!    override comparison all read the same `Ord` impl.
//!
//! 2. **Closed categories.** `Feature` and `Category` are exhaustive
//!    enums. Every feature owns a fixed category list that always
//!    contains `Category::Unknown`; a fact set can never hold a value
//!    outside its feature's list.
//!
//! 3. **Missing is not an error.** Looking up an absent feature yields
//!    `Category::Unknown`. Lenient parsing maps unrecognized input to
//!    `unknown` instead of failing.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `triage-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod error;
pub mod facts;
pub mod identity;
pub mod normalize;
pub mod severity;

// Re-export primary types for ergonomic imports.
pub use error::TriageError;
pub use facts::{Category, FactSet, Feature, FEATURE_COUNT};
pub use identity::CaseId;
pub use normalize::{FeatureNormalizer, NormalizerThresholds, ThresholdNormalizer, Vitals};
pub use severity::{SeverityLevel, SEVERITY_LEVEL_COUNT};
