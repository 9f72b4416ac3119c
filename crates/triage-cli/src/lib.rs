//! # triage-cli — Command-Line Front End for the Triage Stack
//!
//! Provides the `triage` binary. Every subcommand is a thin wrapper over
//! the library crates; no decision logic lives here.
//!
//! ## Subcommands
//!
//! - `triage classify` — Normalize one case's vitals and symptoms, run the
//!   fused rule/estimator/decider pipeline, print the outcome.
//! - `triage lint` — Configuration-time findings for a rule set.
//! - `triage explain` — Render explanation lines for rule ids.
//! - `triage train` — Fit the naive Bayes estimator on a labelled dataset,
//!   report holdout metrics, save the model.
//! - `triage dispatch` — Classify a batch of cases into the priority queue
//!   and replay a command script against it.
//!
//! ```bash
//! triage train --dataset data/cases.json --out data/nb_model.json
//! triage classify --spo2 96 --rr 32 --dyspnea yes --model data/nb_model.json
//! triage lint --rules rules/triage.yaml
//! triage dispatch --cases arrivals.json --script session.txt
//! ```

pub mod case;
pub mod classify;
pub mod config;
pub mod dispatch;
pub mod explain;
pub mod lint;
pub mod train;

pub use case::CaseInput;
pub use config::TriageConfig;
