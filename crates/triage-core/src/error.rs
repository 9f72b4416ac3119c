//! # Error Types
//!
//! Errors raised when parsing triage vocabulary strictly (configuration
//! files, CLI arguments). Lenient paths, such as building a fact set from
//! untrusted observations, never produce these: they fall back to
//! `Category::Unknown` instead.

use thiserror::Error;

/// Top-level error type for the core vocabulary.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TriageError {
    /// A severity name did not match any `SeverityLevel`.
    #[error("unknown severity level: {0:?}")]
    UnknownSeverity(String),

    /// A feature name did not match any `Feature`.
    #[error("unknown feature: {0:?}")]
    UnknownFeature(String),

    /// A category name did not match any `Category`.
    #[error("unknown category: {0:?}")]
    UnknownCategory(String),

    /// The category exists but is not in the feature's closed list.
    #[error("category {category} is not valid for feature {feature}")]
    CategoryOutsideFeature {
        /// Feature being assigned.
        feature: String,
        /// Offending category.
        category: String,
    },

    /// A `key=value` fact assignment was malformed.
    #[error("malformed fact assignment {0:?}: expected feature=category")]
    MalformedAssignment(String),
}
