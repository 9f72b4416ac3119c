//! # Error Types
//!
//! One enum per concern, each variant carrying the offending input. The
//! fuser wraps estimator failures with the estimator's name so a failed
//! request can be attributed without a backtrace.

use thiserror::Error;

use triage_core::SeverityLevel;

/// A posterior distribution failed validation. Invalid distributions are
/// rejected, never renormalized.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PosteriorError {
    /// A probability was NaN or infinite.
    #[error("probability for {level} is not finite: {value}")]
    NonFinite {
        /// Affected class.
        level: SeverityLevel,
        /// Offending value.
        value: f64,
    },

    /// A probability was outside `[0, 1]`.
    #[error("probability for {level} is outside [0, 1]: {value}")]
    OutOfRange {
        /// Affected class.
        level: SeverityLevel,
        /// Offending value.
        value: f64,
    },

    /// A class had no entry.
    #[error("posterior has no entry for {0}")]
    MissingClass(SeverityLevel),

    /// Probabilities did not sum to one.
    #[error("probabilities sum to {sum}, expected 1 within {tolerance}")]
    SumOutOfTolerance {
        /// Observed sum.
        sum: f64,
        /// Allowed deviation.
        tolerance: f64,
    },
}

/// A cost matrix failed validation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CostMatrixError {
    /// A cost was negative or not finite.
    #[error("cost({truth}, {predicted}) must be a non-negative finite number, got {value}")]
    InvalidCost {
        /// True class.
        truth: SeverityLevel,
        /// Predicted class.
        predicted: SeverityLevel,
        /// Offending value.
        value: f64,
    },

    /// A correct classification carried a cost.
    #[error("cost({level}, {level}) must be zero, got {value}")]
    NonZeroDiagonal {
        /// Class on the diagonal.
        level: SeverityLevel,
        /// Offending value.
        value: f64,
    },

    /// Under-triage was not strictly costlier than the mirrored over-triage.
    #[error(
        "under-triage cost({truth}, {predicted}) = {under} must exceed \
         over-triage cost({predicted}, {truth}) = {over}"
    )]
    AsymmetryViolated {
        /// True (more severe) class.
        truth: SeverityLevel,
        /// Predicted (less severe) class.
        predicted: SeverityLevel,
        /// Under-triage cost.
        under: f64,
        /// Mirrored over-triage cost.
        over: f64,
    },
}

/// A decision policy parameter was out of range.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("decision policy {field} must be within [0, 1], got {value}")]
pub struct PolicyError {
    /// Field name.
    pub field: &'static str,
    /// Offending value.
    pub value: f64,
}

/// A posterior estimator could not produce a distribution.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EstimatorError {
    /// No trained model is available.
    #[error("estimator is not trained")]
    Untrained,

    /// The estimator produced an invalid distribution.
    #[error("estimator produced an invalid posterior: {0}")]
    InvalidPosterior(#[from] PosteriorError),

    /// Any other estimator failure.
    #[error("estimator failed: {0}")]
    Failed(String),
}

/// Training, persistence, or validation of a naive Bayes model failed.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Persisted model has an unsupported schema version.
    #[error("unsupported model schema version {found}, expected {expected}")]
    SchemaVersion {
        /// Version found in the file.
        found: u32,
        /// Version this build reads.
        expected: u32,
    },

    /// A probability table is malformed.
    #[error("invalid model probabilities in {context}: {message}")]
    InvalidProbabilities {
        /// Which table (`priors`, `likelihoods[red][spo2]`, ...).
        context: String,
        /// What is wrong.
        message: String,
    },

    /// No usable training samples.
    #[error("training dataset is empty")]
    EmptyDataset,

    /// A training or split option was out of range.
    #[error("invalid option {name}: {message}")]
    InvalidOption {
        /// Option name.
        name: &'static str,
        /// What is wrong.
        message: String,
    },

    /// Reading or writing a file failed.
    #[error("i/o error on {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// JSON (de)serialization failed.
    #[error("malformed JSON in {path}: {source}")]
    Json {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: serde_json::Error,
    },
}

/// A classification request could not be completed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FusionError {
    /// The rules did not settle the case and no trained estimator is
    /// available.
    #[error("classifier unavailable: {reason}")]
    ClassifierUnavailable {
        /// Why the classifier could not be used.
        reason: String,
    },

    /// The estimator returned an invalid distribution.
    #[error("estimator {estimator} returned an invalid posterior: {source}")]
    InvalidPosterior {
        /// Estimator name.
        estimator: String,
        /// Validation failure.
        #[source]
        source: PosteriorError,
    },

    /// The estimator failed for another reason.
    #[error("estimator {estimator} failed: {message}")]
    Estimator {
        /// Estimator name.
        estimator: String,
        /// Failure message.
        message: String,
    },
}
