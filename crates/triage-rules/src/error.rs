//! # Rule Set Errors
//!
//! Load-time failures only. Evaluation itself never fails: missing facts
//! read as `unknown` and a rule that cannot match simply does not fire.

use thiserror::Error;

/// Errors raised while constructing or loading a [`crate::RuleSet`].
#[derive(Error, Debug)]
pub enum RuleSetError {
    /// Two rules share an identifier.
    #[error("duplicate rule id {0:?}")]
    DuplicateId(String),

    /// A rule declared an empty identifier.
    #[error("rule at position {0} has an empty id")]
    EmptyId(usize),

    /// The rule document could not be parsed.
    #[error("failed to parse {format} rule set: {message}")]
    Parse {
        /// Document format (`yaml` or `json`).
        format: &'static str,
        /// Parser message.
        message: String,
    },

    /// Reading the rule file failed.
    #[error("failed to read rule set {path}: {source}")]
    Io {
        /// File path.
        path: String,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },
}
