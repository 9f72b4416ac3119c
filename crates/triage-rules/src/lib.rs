//! # triage-rules — Forward-Chaining Rule Engine
//!
//! Evaluates a static, declarative [`RuleSet`] against a case's facts and
//! reports what the rule layer mandates: a hard severity (when any
//! `HardAssign` rule fired), a minimum-severity floor, and the ordered
//! list of fired rules for the explanation trail.
//!
//! ## Architecture
//!
//! - **Rule** (`rule.rs`): conditions, consequents, and the rule record.
//!   Consequents are a tagged enum (`HardAssign` | `RaiseFloor`), never a
//!   free-form key/value bag.
//!
//! - **RuleSet** (`ruleset.rs`): ordered, id-unique rule collection loaded
//!   once from YAML/JSON or built from the default knowledge base.
//!
//! - **Engine** (`engine.rs`): conflict resolution by priority, then
//!   specificity, then declaration order; iterates to fixpoint or until the
//!   current severity reaches the top level.
//!
//! - **Lint** (`lint.rs`): configuration-time findings such as a
//!   `HardAssign` keyed on `unknown`. Never consulted at evaluation time.
//!
//! - **Explain** (`explain.rs`): pure mapping from fired ids to readable
//!   lines, replayable for audit.

pub mod engine;
pub mod error;
pub mod explain;
pub mod lint;
pub mod rule;
pub mod ruleset;

pub use engine::{Evaluation, RuleEngine, WorkingFacts};
pub use error::RuleSetError;
pub use explain::{render_explanation, ExplanationLine};
pub use lint::{LintFinding, LintKind};
pub use rule::{Condition, Consequent, Rule, RuleId};
pub use ruleset::{default_knowledge_base, RuleSet};
