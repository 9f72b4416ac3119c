//! # Rules
//!
//! A rule's antecedent is `all` (every condition must hold) AND `any` (at
//! least one must hold; vacuously true when empty). Its consequent either
//! fixes the severity outright or raises the minimum-severity floor.
//!
//! ## Document Format
//!
//! ```yaml
//! - id: CRIT_SPO2
//!   description: Severe hypoxaemia
//!   all:
//!     - { feature: spo2, value: severe }
//!   then: { hard_assign: red }
//!   priority: 100
//! ```

use serde::{Deserialize, Serialize};

use triage_core::{Category, Feature, SeverityLevel};

use crate::engine::WorkingFacts;

/// Rule identifier. Unique within a [`crate::RuleSet`].
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(String);

impl RuleId {
    /// Wrap an identifier string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RuleId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl std::fmt::Display for RuleId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single required (feature, value) pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Condition {
    /// An observed feature holds exactly this category.
    Observed {
        /// Feature to test.
        feature: Feature,
        /// Required category.
        value: Category,
    },
    /// The engine's current severity fact equals this level.
    CurrentSeverity {
        /// Required current severity.
        current_severity: SeverityLevel,
    },
}

impl Condition {
    /// Shorthand for [`Condition::Observed`].
    pub fn observed(feature: Feature, value: Category) -> Self {
        Self::Observed { feature, value }
    }

    /// Whether the condition holds against the working fact set.
    pub fn holds(&self, facts: &WorkingFacts) -> bool {
        match *self {
            Self::Observed { feature, value } => facts.observed().holds(feature, value),
            Self::CurrentSeverity { current_severity } => {
                facts.current_severity() == Some(current_severity)
            }
        }
    }

    /// Whether this condition tests for the `unknown` category.
    pub fn is_keyed_on_unknown(&self) -> bool {
        matches!(self, Self::Observed { value, .. } if value.is_unknown())
    }
}

impl std::fmt::Display for Condition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Observed { feature, value } => write!(f, "{feature}={value}"),
            Self::CurrentSeverity { current_severity } => {
                write!(f, "current_severity={current_severity}")
            }
        }
    }
}

/// What a rule does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consequent {
    /// Set the current severity outright.
    HardAssign(SeverityLevel),
    /// Guarantee at least this severity.
    RaiseFloor(SeverityLevel),
}

impl Consequent {
    /// The severity named by the consequent.
    pub fn severity(&self) -> SeverityLevel {
        match *self {
            Self::HardAssign(s) | Self::RaiseFloor(s) => s,
        }
    }

    /// Whether this is a hard assignment.
    pub fn is_hard(&self) -> bool {
        matches!(self, Self::HardAssign(_))
    }
}

impl std::fmt::Display for Consequent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HardAssign(s) => write!(f, "{s}"),
            Self::RaiseFloor(s) => write!(f, ">= {s}"),
        }
    }
}

/// A declarative production rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rule {
    /// Unique identifier.
    pub id: RuleId,
    /// Human-readable rationale, shown in explanations.
    #[serde(default)]
    pub description: String,
    /// Conditions that must all hold.
    #[serde(default)]
    pub all: Vec<Condition>,
    /// Alternatives of which at least one must hold (ignored when empty).
    #[serde(default)]
    pub any: Vec<Condition>,
    /// Effect when fired.
    #[serde(with = "serde_yaml::with::singleton_map")]
    pub then: Consequent,
    /// Conflict-resolution weight; higher wins.
    #[serde(default)]
    pub priority: i32,
}

impl Rule {
    /// Start a rule with no conditions.
    pub fn new(id: impl Into<String>, then: Consequent, priority: i32) -> Self {
        Self {
            id: RuleId::new(id),
            description: String::new(),
            all: Vec::new(),
            any: Vec::new(),
            then,
            priority,
        }
    }

    /// Add a required condition.
    pub fn when(mut self, feature: Feature, value: Category) -> Self {
        self.all.push(Condition::observed(feature, value));
        self
    }

    /// Add an alternative condition.
    pub fn or_when(mut self, feature: Feature, value: Category) -> Self {
        self.any.push(Condition::observed(feature, value));
        self
    }

    /// Add an arbitrary required condition.
    pub fn when_condition(mut self, condition: Condition) -> Self {
        self.all.push(condition);
        self
    }

    /// Set the description.
    pub fn described(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Number of declared conditions. Tie-break after priority.
    pub fn specificity(&self) -> usize {
        self.all.len() + self.any.len()
    }

    /// Whether the antecedent holds against `facts`.
    pub fn matches(&self, facts: &WorkingFacts) -> bool {
        self.all.iter().all(|c| c.holds(facts))
            && (self.any.is_empty() || self.any.iter().any(|c| c.holds(facts)))
    }

    /// Every declared condition, `all` first.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.all.iter().chain(self.any.iter())
    }
}
