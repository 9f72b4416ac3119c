//! # Rule Set Lint
//!
//! Static checks over a loaded rule set. Findings are advisory: the
//! engine evaluates a rule set with findings exactly as it would one
//! without.

use std::collections::HashSet;

use serde::Serialize;

use triage_core::{Category, Feature, SeverityLevel};

use crate::rule::{Condition, RuleId};
use crate::ruleset::RuleSet;

/// What is wrong with a rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LintKind {
    /// A hard assignment fires on an `unknown` reading. Missing data
    /// should not fix a severity outright.
    HardAssignOnUnknown {
        /// Feature tested for `unknown`.
        feature: Feature,
    },
    /// A condition names a category outside the feature's closed list, so
    /// the rule can never match.
    CategoryOutsideFeature {
        /// Feature tested.
        feature: Feature,
        /// Category that the feature never takes.
        category: Category,
    },
    /// The rule has no conditions and matches every case.
    EmptyAntecedent,
    /// The same condition appears more than once in the rule.
    DuplicateCondition {
        /// Rendered condition.
        condition: String,
    },
    /// A `current_severity` condition names a level no hard assignment in
    /// the set produces.
    UnreachableSeverity {
        /// Required level.
        severity: SeverityLevel,
    },
}

impl std::fmt::Display for LintKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HardAssignOnUnknown { feature } => {
                write!(f, "hard assignment keyed on {feature}=unknown")
            }
            Self::CategoryOutsideFeature { feature, category } => write!(
                f,
                "{feature} never takes category {category}; rule can never match"
            ),
            Self::EmptyAntecedent => f.write_str("rule has no conditions and always matches"),
            Self::DuplicateCondition { condition } => {
                write!(f, "condition {condition} is declared more than once")
            }
            Self::UnreachableSeverity { severity } => write!(
                f,
                "no hard assignment produces current_severity={severity}"
            ),
        }
    }
}

/// One finding against one rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintFinding {
    /// Offending rule.
    pub rule_id: RuleId,
    /// What was found.
    #[serde(flatten)]
    pub kind: LintKind,
}

impl std::fmt::Display for LintFinding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.rule_id, self.kind)
    }
}

impl RuleSet {
    /// Run every check, in rule declaration order.
    pub fn lint(&self) -> Vec<LintFinding> {
        let assignable: HashSet<SeverityLevel> = self
            .iter()
            .filter(|r| r.then.is_hard())
            .map(|r| r.then.severity())
            .collect();

        let mut findings = Vec::new();
        for rule in self {
            let mut push = |kind| {
                findings.push(LintFinding {
                    rule_id: rule.id.clone(),
                    kind,
                })
            };

            if rule.specificity() == 0 {
                push(LintKind::EmptyAntecedent);
            }

            let mut seen = HashSet::new();
            for condition in rule.conditions() {
                if !seen.insert(*condition) {
                    push(LintKind::DuplicateCondition {
                        condition: condition.to_string(),
                    });
                }
                match *condition {
                    Condition::Observed { feature, value } => {
                        if !feature.accepts(value) {
                            push(LintKind::CategoryOutsideFeature {
                                feature,
                                category: value,
                            });
                        } else if value.is_unknown() && rule.then.is_hard() {
                            push(LintKind::HardAssignOnUnknown { feature });
                        }
                    }
                    Condition::CurrentSeverity { current_severity } => {
                        if !assignable.contains(&current_severity) {
                            push(LintKind::UnreachableSeverity {
                                severity: current_severity,
                            });
                        }
                    }
                }
            }
        }
        findings
    }
}
