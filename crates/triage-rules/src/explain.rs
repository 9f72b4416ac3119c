//! # Explanations
//!
//! Renders a fired-rule trail as human-readable lines. Rendering is a pure
//! function of the rule set and the trail, so an explanation can be
//! replayed from an audit record.

use serde::Serialize;

use crate::rule::{Consequent, RuleId};
use crate::ruleset::RuleSet;

/// One fired rule, as shown to a clinician.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExplanationLine {
    /// Rule id.
    pub id: RuleId,
    /// Rule priority.
    pub priority: i32,
    /// What the rule did.
    pub consequent: Consequent,
    /// Rule description, possibly empty.
    pub description: String,
}

impl std::fmt::Display for ExplanationLine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] (prio {}) -> {}", self.id, self.priority, self.consequent)?;
        if !self.description.is_empty() {
            write!(f, ": {}", self.description)?;
        }
        Ok(())
    }
}

impl RuleSet {
    /// Explanation lines for `fired`, in the same order. Ids not present in
    /// this rule set are skipped.
    pub fn explain(&self, fired: &[RuleId]) -> Vec<ExplanationLine> {
        fired
            .iter()
            .filter_map(|id| self.get(id.as_str()))
            .map(|rule| ExplanationLine {
                id: rule.id.clone(),
                priority: rule.priority,
                consequent: rule.then,
                description: rule.description.clone(),
            })
            .collect()
    }
}

/// Join explanation lines, one per line.
pub fn render_explanation(lines: &[ExplanationLine]) -> String {
    if lines.is_empty() {
        return "(no rules fired)".to_string();
    }
    lines
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ruleset::default_knowledge_base;

    #[test]
    fn test_explain_in_trail_order() {
        let kb = default_knowledge_base();
        let fired = vec![
            RuleId::new("MIN_CHEST_PAIN_DYSPNEA"),
            RuleId::new("MIN_FEVER_NO_DYSPNEA"),
        ];
        let lines = kb.explain(&fired);
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0].to_string(),
            "[MIN_CHEST_PAIN_DYSPNEA] (prio 50) -> >= yellow: Chest pain with dyspnea: at least yellow"
        );
        assert_eq!(lines[1].id.as_str(), "MIN_FEVER_NO_DYSPNEA");
    }

    #[test]
    fn test_hard_assign_line() {
        let kb = default_knowledge_base();
        let lines = kb.explain(&[RuleId::new("CRIT_SPO2")]);
        assert_eq!(
            render_explanation(&lines),
            "[CRIT_SPO2] (prio 100) -> red: Severe hypoxaemia"
        );
    }

    #[test]
    fn test_unknown_ids_skipped() {
        let kb = default_knowledge_base();
        assert!(kb.explain(&[RuleId::new("NOPE")]).is_empty());
    }

    #[test]
    fn test_empty_trail() {
        assert_eq!(render_explanation(&[]), "(no rules fired)");
    }

    #[test]
    fn test_replay_is_deterministic() {
        let kb = default_knowledge_base();
        let fired = vec![RuleId::new("CRIT_SBP")];
        assert_eq!(kb.explain(&fired), kb.explain(&fired));
    }
}
