//! # Decision Fusion
//!
//! Combines the rule layer and the probabilistic layer into one outcome:
//!
//! 1. Evaluate the rules.
//! 2. A hard assignment to the top level settles the case. The estimator
//!    is not consulted and the posterior is degenerate on the top level.
//! 3. Otherwise the effective floor is the more severe of the rule floor
//!    and any lower hard assignment. The estimator's posterior goes to
//!    the cost-sensitive decider together with that floor.
//! 4. The outcome carries the final level, the fired-rule trail, its
//!    rendered explanation, the posterior, and the decision record.
//!
//! The fuser holds only shared, read-only state and is `Send + Sync`.

use std::sync::Arc;

use serde::Serialize;

use triage_core::{FactSet, SeverityLevel};
use triage_rules::{Evaluation, ExplanationLine, RuleEngine, RuleId};

use crate::decider::{CostSensitiveDecider, Decision};
use crate::error::{EstimatorError, FusionError};
use crate::estimator::PosteriorEstimator;
use crate::posterior::Posterior;

/// Which layer settled the case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutcomeSource {
    /// A hard assignment to the top level.
    RuleOverride,
    /// The cost-sensitive decider.
    CostDecision,
}

impl std::fmt::Display for OutcomeSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::RuleOverride => "rule override",
            Self::CostDecision => "cost decision",
        })
    }
}

/// Everything known about one classified case.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriageOutcome {
    /// Final severity.
    pub severity: SeverityLevel,
    /// Layer that produced it.
    pub source: OutcomeSource,
    /// Floor that applied to the decider, if any.
    pub floor: Option<SeverityLevel>,
    /// Fired rules, in application order.
    pub fired: Vec<RuleId>,
    /// Rendered trail.
    pub explanation: Vec<ExplanationLine>,
    /// Posterior used (degenerate on a rule override).
    pub posterior: Posterior,
    /// Decider record, absent on a rule override.
    pub decision: Option<Decision>,
    /// Raw rule evaluation.
    pub evaluation: Evaluation,
}

/// Rule engine, estimator, and decider wired together.
#[derive(Clone)]
pub struct DecisionFuser {
    engine: RuleEngine,
    decider: CostSensitiveDecider,
    estimator: Option<Arc<dyn PosteriorEstimator>>,
}

impl std::fmt::Debug for DecisionFuser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionFuser")
            .field("engine", &self.engine)
            .field("decider", &self.decider)
            .field("estimator", &self.estimator.as_ref().map(|e| e.name().to_string()))
            .finish()
    }
}

impl DecisionFuser {
    /// Fuser without an estimator. Cases the rules do not settle fail
    /// with [`FusionError::ClassifierUnavailable`].
    pub fn new(engine: RuleEngine, decider: CostSensitiveDecider) -> Self {
        Self {
            engine,
            decider,
            estimator: None,
        }
    }

    /// Attach an estimator.
    pub fn with_estimator(mut self, estimator: Arc<dyn PosteriorEstimator>) -> Self {
        self.estimator = Some(estimator);
        self
    }

    /// The rule engine.
    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// The decider.
    pub fn decider(&self) -> &CostSensitiveDecider {
        &self.decider
    }

    /// Classify one case. `facts` is not modified.
    pub fn classify(&self, facts: &FactSet) -> Result<TriageOutcome, FusionError> {
        let evaluation = self.engine.evaluate(facts);
        let explanation = self.engine.rules().explain(&evaluation.fired);

        if evaluation.is_top_override() {
            tracing::debug!(fired = evaluation.fired.len(), "top-severity rule override");
            return Ok(TriageOutcome {
                severity: SeverityLevel::TOP,
                source: OutcomeSource::RuleOverride,
                floor: evaluation.floor,
                fired: evaluation.fired.clone(),
                explanation,
                posterior: Posterior::degenerate(SeverityLevel::TOP),
                decision: None,
                evaluation,
            });
        }

        let floor = match (evaluation.floor, evaluation.hard_severity) {
            (Some(f), Some(h)) => Some(f.more_severe(h)),
            (f, h) => f.or(h),
        };

        let estimator = self
            .estimator
            .as_ref()
            .ok_or_else(|| FusionError::ClassifierUnavailable {
                reason: "no estimator configured".to_string(),
            })?;
        let posterior = estimator
            .posterior(facts)
            .map_err(|e| fusion_error(estimator.name(), e))?;

        let decision = self.decider.decide(&posterior, floor);
        tracing::debug!(
            severity = %decision.severity,
            floor = ?floor,
            adjustments = decision.adjustments.len(),
            "cost decision"
        );

        Ok(TriageOutcome {
            severity: decision.severity,
            source: OutcomeSource::CostDecision,
            floor,
            fired: evaluation.fired.clone(),
            explanation,
            posterior,
            decision: Some(decision),
            evaluation,
        })
    }
}

fn fusion_error(estimator: &str, err: EstimatorError) -> FusionError {
    match err {
        EstimatorError::Untrained => FusionError::ClassifierUnavailable {
            reason: format!("estimator {estimator} is not trained"),
        },
        EstimatorError::InvalidPosterior(source) => FusionError::InvalidPosterior {
            estimator: estimator.to_string(),
            source,
        },
        EstimatorError::Failed(message) => FusionError::Estimator {
            estimator: estimator.to_string(),
            message,
        },
    }
}
