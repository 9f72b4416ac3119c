//! # Case Input and Outcome Rendering
//!
//! A case arrives as raw [`Vitals`] plus optional explicit facts. Explicit
//! facts win over normalized ones, except that an explicit `unknown` never
//! erases a measured value.

use std::fmt;

use serde::{Deserialize, Serialize};

use triage_core::{FactSet, FeatureNormalizer, SeverityLevel, Vitals};
use triage_decision::TriageOutcome;

/// One case as read from a cases file or assembled from flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseInput {
    /// Display name.
    pub name: Option<String>,
    /// Raw observations.
    pub vitals: Vitals,
    /// Explicit facts, applied after normalization.
    pub facts: FactSet,
}

impl CaseInput {
    /// Normalized vitals overlaid with the explicit facts.
    pub fn to_facts(&self, normalizer: &dyn FeatureNormalizer) -> FactSet {
        let mut facts = normalizer.normalize(&self.vitals);
        for (feature, category) in self.facts.iter() {
            if !category.is_unknown() {
                facts.set(feature, category);
            }
        }
        facts
    }
}

/// Multi-line human rendering of an outcome and the facts it was
/// classified from.
pub struct OutcomeReport<'a> {
    /// The fused result.
    pub outcome: &'a TriageOutcome,
    /// Facts the outcome was computed from.
    pub facts: &'a FactSet,
}

impl fmt::Display for OutcomeReport<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = self.outcome;
        writeln!(f, "severity: {} ({})", outcome.severity, outcome.source)?;
        if let Some(floor) = outcome.floor {
            writeln!(f, "floor:    >= {floor}")?;
        }
        writeln!(f, "facts:    {}", self.facts)?;
        writeln!(f, "rules:")?;
        if outcome.explanation.is_empty() {
            writeln!(f, "  (no rules fired)")?;
        }
        for line in &outcome.explanation {
            writeln!(f, "  {line}")?;
        }
        if let Some(decision) = &outcome.decision {
            writeln!(f, "posterior: {}", decision.posterior)?;
            let costs: Vec<String> = SeverityLevel::descending()
                .map(|l| format!("{l}={:.2}", decision.expected_cost(l)))
                .collect();
            writeln!(f, "expected cost: {}", costs.join(" "))?;
            writeln!(f, "cost minimizer: {}", decision.cost_minimizer)?;
            for adjustment in &decision.adjustments {
                writeln!(f, "  {adjustment}")?;
            }
        }
        Ok(())
    }
}
