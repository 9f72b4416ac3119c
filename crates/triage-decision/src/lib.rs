//! # triage-decision — Cost-Sensitive Severity Decisions
//!
//! Turns a posterior distribution over severity levels into a single
//! level, and fuses that decision with the rule layer's verdict.
//!
//! ## Architecture
//!
//! - **Posterior** (`posterior.rs`): validated distribution. Invalid
//!   input is rejected, never renormalized.
//!
//! - **CostMatrix** (`cost.rs`): asymmetric misclassification costs.
//!   Under-triage is always strictly costlier than the mirrored
//!   over-triage.
//!
//! - **Decider** (`decider.rs`): expected-cost minimization followed by
//!   floor, guardrail, and confidence-override steps, each recorded for
//!   audit.
//!
//! - **Estimator** (`estimator.rs`): the `PosteriorEstimator` trait, the
//!   only contract the decision layer has with any model.
//!
//! - **Naive Bayes** (`naive_bayes/`): categorical estimator with a
//!   versioned JSON schema, training, holdout evaluation.
//!
//! - **Fusion** (`fusion.rs`): rules first; a top-level hard assignment
//!   short-circuits the estimator entirely.

pub mod cost;
pub mod decider;
pub mod error;
pub mod estimator;
pub mod fusion;
pub mod naive_bayes;
pub mod posterior;

pub use cost::{CostEntry, CostMatrix};
pub use decider::{Adjustment, CostSensitiveDecider, Decision, DecisionPolicy};
pub use error::{
    CostMatrixError, EstimatorError, FusionError, ModelError, PolicyError, PosteriorError,
};
pub use estimator::PosteriorEstimator;
pub use fusion::{DecisionFuser, OutcomeSource, TriageOutcome};
pub use naive_bayes::{
    evaluate, load_dataset, parse_dataset, split_holdout, ConfusionMatrix, FitOptions,
    LikelihoodTable, NaiveBayesModel, Sample, MODEL_SCHEMA_VERSION,
};
pub use posterior::{Posterior, POSTERIOR_TOLERANCE};
