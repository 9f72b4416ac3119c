//! # Cost-Sensitive Decider
//!
//! Picks the severity that minimizes expected misclassification cost,
//! then applies, in order:
//!
//! 1. **Floor**: never below the rule-imposed minimum.
//! 2. **Guardrail**: when the minimizer lands on the top level without a
//!    top floor and `p(top)` is under `evidence_threshold`, choose again
//!    among the non-top levels and re-apply the floor.
//! 3. **Confidence override**: only when there is no floor. If the MAP
//!    class differs from the choice by at least `confidence_margin` in
//!    probability, take the MAP class.
//!
//! Every adjustment is recorded on the [`Decision`] so an auditor can see
//! why the returned level differs from the plain cost minimizer.
//!
//! ## Open Question
//!
//! The confidence override runs after the guardrail and can therefore
//! reselect the top level when `p(top)` exceeds every other class by the
//! margin. Both thresholds are policy, loaded from configuration.

use serde::{Deserialize, Serialize};

use triage_core::{SeverityLevel, SEVERITY_LEVEL_COUNT};

use crate::cost::CostMatrix;
use crate::error::PolicyError;
use crate::posterior::Posterior;

/// Costs closer than this are ties, resolved toward the less severe level.
const COST_TIE_EPSILON: f64 = 1e-12;

/// Tunable thresholds for the guardrail and the confidence override.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecisionPolicy {
    /// Minimum `p(top)` for the minimizer to choose the top level without
    /// a top floor.
    pub evidence_threshold: f64,
    /// Probability lead the MAP class needs to override the minimizer.
    pub confidence_margin: f64,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            evidence_threshold: 0.20,
            confidence_margin: 0.40,
        }
    }
}

impl DecisionPolicy {
    /// Both thresholds must be finite and within `[0, 1]`.
    pub fn validate(&self) -> Result<(), PolicyError> {
        for (field, value) in [
            ("evidence_threshold", self.evidence_threshold),
            ("confidence_margin", self.confidence_margin),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PolicyError { field, value });
            }
        }
        Ok(())
    }
}

/// A post-minimization change to the chosen level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Adjustment {
    /// Raised to the rule floor.
    FloorRaised {
        /// Level before.
        from: SeverityLevel,
        /// Floor.
        to: SeverityLevel,
    },
    /// Top level rejected for weak evidence.
    Guardrail {
        /// Level before (always the top level).
        from: SeverityLevel,
        /// Replacement.
        to: SeverityLevel,
        /// `p(top)` that fell short.
        p_top: f64,
    },
    /// MAP class taken over the minimizer.
    ConfidenceOverride {
        /// Level before.
        from: SeverityLevel,
        /// MAP class.
        to: SeverityLevel,
        /// `p(map) - p(from)`.
        lead: f64,
    },
}

impl std::fmt::Display for Adjustment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::FloorRaised { from, to } => write!(f, "floor: {from} -> {to}"),
            Self::Guardrail { from, to, p_top } => {
                write!(f, "guardrail: {from} -> {to} (p(top)={p_top:.3})")
            }
            Self::ConfidenceOverride { from, to, lead } => {
                write!(f, "confidence override: {from} -> {to} (lead={lead:.3})")
            }
        }
    }
}

/// Outcome of one [`CostSensitiveDecider::decide`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    /// Final level.
    pub severity: SeverityLevel,
    /// Plain expected-cost minimizer before adjustments.
    pub cost_minimizer: SeverityLevel,
    /// Floor that was in force.
    pub floor: Option<SeverityLevel>,
    /// Input distribution.
    pub posterior: Posterior,
    /// Expected cost per candidate, indexed by rank.
    pub expected_costs: [f64; SEVERITY_LEVEL_COUNT],
    /// Adjustments in the order applied.
    pub adjustments: Vec<Adjustment>,
}

impl Decision {
    /// Expected cost of `level` under this decision's posterior.
    pub fn expected_cost(&self, level: SeverityLevel) -> f64 {
        self.expected_costs[level.rank()]
    }
}

/// Expected-cost minimizer with floor, guardrail, and override steps.
#[derive(Debug, Clone, Default)]
pub struct CostSensitiveDecider {
    costs: CostMatrix,
    policy: DecisionPolicy,
}

impl CostSensitiveDecider {
    /// Decider over a validated matrix and policy.
    pub fn new(costs: CostMatrix, policy: DecisionPolicy) -> Result<Self, PolicyError> {
        policy.validate()?;
        Ok(Self { costs, policy })
    }

    /// The cost matrix in use.
    pub fn costs(&self) -> &CostMatrix {
        &self.costs
    }

    /// The policy in use.
    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// Choose a level for `posterior`, never below `floor`.
    pub fn decide(&self, posterior: &Posterior, floor: Option<SeverityLevel>) -> Decision {
        let expected_costs = self.costs.expected_costs(posterior);
        let minimizer = argmin(&expected_costs, SeverityLevel::ALL.into_iter());
        let mut chosen = minimizer;
        let mut adjustments = Vec::new();

        let raised = chosen.at_least(floor);
        if raised != chosen {
            adjustments.push(Adjustment::FloorRaised {
                from: chosen,
                to: raised,
            });
            chosen = raised;
        }

        let p_top = posterior.probability(SeverityLevel::TOP);
        let top_floor = floor.is_some_and(SeverityLevel::is_top);
        if chosen.is_top() && !top_floor && p_top < self.policy.evidence_threshold {
            let fallback = argmin(
                &expected_costs,
                SeverityLevel::ALL.into_iter().filter(|l| !l.is_top()),
            )
            .at_least(floor);
            adjustments.push(Adjustment::Guardrail {
                from: chosen,
                to: fallback,
                p_top,
            });
            chosen = fallback;
        }

        if floor.is_none() {
            let map = posterior.map_class();
            let lead = posterior.probability(map) - posterior.probability(chosen);
            if map != chosen && lead >= self.policy.confidence_margin {
                adjustments.push(Adjustment::ConfidenceOverride {
                    from: chosen,
                    to: map,
                    lead,
                });
                chosen = map;
            }
        }

        for adjustment in &adjustments {
            tracing::debug!(%adjustment, "decision adjusted");
        }

        Decision {
            severity: chosen,
            cost_minimizer: minimizer,
            floor,
            posterior: *posterior,
            expected_costs,
            adjustments,
        }
    }
}

/// Least-cost candidate; ties go to the first (least severe) candidate.
fn argmin(
    costs: &[f64; SEVERITY_LEVEL_COUNT],
    candidates: impl Iterator<Item = SeverityLevel>,
) -> SeverityLevel {
    let mut best: Option<SeverityLevel> = None;
    for level in candidates {
        best = match best {
            Some(b) if costs[level.rank()] >= costs[b.rank()] - COST_TIE_EPSILON => Some(b),
            _ => Some(level),
        };
    }
    best.unwrap_or(SeverityLevel::BOTTOM)
}
