//! # Forward-Chaining Evaluation
//!
//! Repeatedly selects, among rules not yet fired whose antecedent matches
//! the *current* working facts, the single best rule and applies it:
//!
//! 1. highest `priority`,
//! 2. then highest specificity (number of conditions),
//! 3. then earliest declaration order.
//!
//! `HardAssign` overwrites the working current-severity fact; `RaiseFloor`
//! raises the running floor. Iteration stops when no unfired rule matches
//! or when the current severity is the top level.
//!
//! ## Termination
//!
//! Each step fires exactly one previously unfired rule, so evaluation
//! performs at most `rules.len()` steps.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use triage_core::{FactSet, SeverityLevel};

use crate::rule::{Consequent, Rule, RuleId};
use crate::ruleset::RuleSet;

/// The engine's working memory: the caller's observed facts plus the
/// derived current-severity fact.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingFacts {
    observed: FactSet,
    current_severity: Option<SeverityLevel>,
}

impl WorkingFacts {
    /// Working facts seeded from observations, no current severity.
    pub fn from_observed(observed: FactSet) -> Self {
        Self {
            observed,
            current_severity: None,
        }
    }

    /// The observed facts.
    pub fn observed(&self) -> &FactSet {
        &self.observed
    }

    /// The current severity fact, if any hard assignment has fired.
    pub fn current_severity(&self) -> Option<SeverityLevel> {
        self.current_severity
    }
}

/// Outcome of evaluating a rule set against one fact set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    /// Most severe `HardAssign` that fired, if any.
    pub hard_severity: Option<SeverityLevel>,
    /// Most severe `RaiseFloor` that fired, if any.
    pub floor: Option<SeverityLevel>,
    /// Fired rule ids in application order.
    pub fired: Vec<RuleId>,
    /// Working facts at fixpoint.
    pub final_facts: WorkingFacts,
}

impl Evaluation {
    /// Whether a hard assignment reached the top severity.
    pub fn is_top_override(&self) -> bool {
        self.hard_severity.is_some_and(SeverityLevel::is_top)
    }
}

/// Evaluates a shared, read-only rule set.
///
/// Stateless between calls; safe to share across threads.
#[derive(Debug, Clone)]
pub struct RuleEngine {
    rules: Arc<RuleSet>,
}

impl RuleEngine {
    /// Engine over `rules`.
    pub fn new(rules: Arc<RuleSet>) -> Self {
        Self { rules }
    }

    /// Engine over the built-in knowledge base.
    pub fn with_default_rules() -> Self {
        Self::new(Arc::new(crate::ruleset::default_knowledge_base()))
    }

    /// The rule set this engine evaluates.
    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Evaluate `facts` to fixpoint. The caller's fact set is not mutated.
    pub fn evaluate(&self, facts: &FactSet) -> Evaluation {
        let rules = self.rules.rules();
        let mut working = WorkingFacts::from_observed(facts.clone());
        let mut fired_mask = vec![false; rules.len()];
        let mut fired = Vec::new();
        let mut hard_severity: Option<SeverityLevel> = None;
        let mut floor: Option<SeverityLevel> = None;

        loop {
            if working.current_severity.is_some_and(SeverityLevel::is_top) {
                break;
            }

            let Some(idx) = select(rules, &fired_mask, &working) else {
                break;
            };
            let rule = &rules[idx];
            fired_mask[idx] = true;
            fired.push(rule.id.clone());

            match rule.then {
                Consequent::HardAssign(level) => {
                    working.current_severity = Some(level);
                    hard_severity = Some(level.at_least(hard_severity));
                }
                Consequent::RaiseFloor(level) => {
                    floor = Some(level.at_least(floor));
                }
            }
            tracing::debug!(
                rule_id = %rule.id,
                priority = rule.priority,
                consequent = %rule.then,
                "rule fired"
            );
        }

        Evaluation {
            hard_severity,
            floor,
            fired,
            final_facts: working,
        }
    }
}

/// Index of the winning eligible rule, if any.
fn select(rules: &[Rule], fired_mask: &[bool], working: &WorkingFacts) -> Option<usize> {
    rules
        .iter()
        .enumerate()
        .filter(|(i, r)| !fired_mask[*i] && r.matches(working))
        .max_by(|(ia, a), (ib, b)| {
            a.priority
                .cmp(&b.priority)
                .then(a.specificity().cmp(&b.specificity()))
                // Earlier declaration wins, so the lower index compares greater.
                .then(ib.cmp(ia))
        })
        .map(|(i, _)| i)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::Condition;
    use proptest::prelude::*;
    use triage_core::{Category, Feature};

    fn engine(rules: Vec<Rule>) -> RuleEngine {
        RuleEngine::new(Arc::new(RuleSet::new(rules).unwrap()))
    }

    fn ids(eval: &Evaluation) -> Vec<&str> {
        eval.fired.iter().map(RuleId::as_str).collect()
    }

    #[test]
    fn test_no_match_yields_nothing() {
        let eval = RuleEngine::with_default_rules().evaluate(&FactSet::new());
        assert_eq!(eval.hard_severity, None);
        assert_eq!(eval.floor, None);
        assert!(eval.fired.is_empty());
    }

    #[test]
    fn test_hard_top_assignment_stops_iteration() {
        // Both critical rules match, but iteration halts after the first
        // top-severity assignment.
        let facts = FactSet::new()
            .with(Feature::Spo2, Category::Severe)
            .with(Feature::Sbp, Category::Severe);
        let eval = RuleEngine::with_default_rules().evaluate(&facts);
        assert_eq!(eval.hard_severity, Some(SeverityLevel::Red));
        assert!(eval.is_top_override());
        assert_eq!(ids(&eval), vec!["CRIT_SPO2"]);
        assert_eq!(eval.final_facts.current_severity(), Some(SeverityLevel::Red));
    }

    #[test]
    fn test_floor_only() {
        let facts = FactSet::new()
            .with(Feature::ChestPain, Category::Yes)
            .with(Feature::Dyspnea, Category::Yes)
            .with(Feature::Spo2, Category::Ok);
        let eval = RuleEngine::with_default_rules().evaluate(&facts);
        assert_eq!(eval.hard_severity, None);
        assert_eq!(eval.floor, Some(SeverityLevel::Yellow));
        assert_eq!(ids(&eval), vec!["MIN_CHEST_PAIN_DYSPNEA"]);
    }

    #[test]
    fn test_floor_is_max_of_fired_floors() {
        let e = engine(vec![
            Rule::new("green", Consequent::RaiseFloor(SeverityLevel::Green), 30)
                .when(Feature::Temp, Category::High),
            Rule::new("yellow", Consequent::RaiseFloor(SeverityLevel::Yellow), 10)
                .when(Feature::Rr, Category::High),
        ]);
        let facts = FactSet::new()
            .with(Feature::Temp, Category::High)
            .with(Feature::Rr, Category::High);
        let eval = e.evaluate(&facts);
        assert_eq!(eval.floor, Some(SeverityLevel::Yellow));
        assert_eq!(ids(&eval), vec!["green", "yellow"]);
    }

    #[test]
    fn test_priority_orders_application() {
        let e = engine(vec![
            Rule::new("low", Consequent::RaiseFloor(SeverityLevel::Green), 1)
                .when(Feature::Temp, Category::High),
            Rule::new("high", Consequent::RaiseFloor(SeverityLevel::Green), 9)
                .when(Feature::Temp, Category::High),
        ]);
        let eval = e.evaluate(&FactSet::new().with(Feature::Temp, Category::High));
        assert_eq!(ids(&eval), vec!["high", "low"]);
    }

    #[test]
    fn test_specificity_breaks_priority_tie() {
        let e = engine(vec![
            Rule::new("broad", Consequent::RaiseFloor(SeverityLevel::Green), 5)
                .when(Feature::Dyspnea, Category::Yes),
            Rule::new("narrow", Consequent::RaiseFloor(SeverityLevel::Yellow), 5)
                .when(Feature::Dyspnea, Category::Yes)
                .when(Feature::Rr, Category::High),
        ]);
        let facts = FactSet::new()
            .with(Feature::Dyspnea, Category::Yes)
            .with(Feature::Rr, Category::High);
        assert_eq!(ids(&e.evaluate(&facts)), vec!["narrow", "broad"]);
    }

    #[test]
    fn test_declaration_order_is_final_tie_break() {
        let e = engine(vec![
            Rule::new("first", Consequent::RaiseFloor(SeverityLevel::Green), 5)
                .when(Feature::Temp, Category::High),
            Rule::new("second", Consequent::RaiseFloor(SeverityLevel::Green), 5)
                .when(Feature::Rr, Category::High),
        ]);
        let facts = FactSet::new()
            .with(Feature::Temp, Category::High)
            .with(Feature::Rr, Category::High);
        assert_eq!(ids(&e.evaluate(&facts)), vec!["first", "second"]);
    }

    #[test]
    fn test_chaining_on_current_severity() {
        let e = engine(vec![
            Rule::new("assign_yellow", Consequent::HardAssign(SeverityLevel::Yellow), 50)
                .when(Feature::ChestPain, Category::Yes),
            Rule::new("escalate", Consequent::HardAssign(SeverityLevel::Red), 10)
                .when_condition(Condition::CurrentSeverity {
                    current_severity: SeverityLevel::Yellow,
                })
                .when(Feature::Rr, Category::High),
        ]);
        let facts = FactSet::new()
            .with(Feature::ChestPain, Category::Yes)
            .with(Feature::Rr, Category::High);
        let eval = e.evaluate(&facts);
        assert_eq!(ids(&eval), vec!["assign_yellow", "escalate"]);
        assert_eq!(eval.hard_severity, Some(SeverityLevel::Red));
    }

    #[test]
    fn test_hard_severity_keeps_most_severe_seen() {
        // A later, less severe hard assignment overwrites the working fact
        // but not the reported maximum.
        let e = engine(vec![
            Rule::new("yellow", Consequent::HardAssign(SeverityLevel::Yellow), 20)
                .when(Feature::Dyspnea, Category::Yes),
            Rule::new("green", Consequent::HardAssign(SeverityLevel::Green), 10)
                .when(Feature::Dyspnea, Category::Yes),
        ]);
        let eval = e.evaluate(&FactSet::new().with(Feature::Dyspnea, Category::Yes));
        assert_eq!(eval.hard_severity, Some(SeverityLevel::Yellow));
        assert_eq!(eval.final_facts.current_severity(), Some(SeverityLevel::Green));
        assert!(!eval.is_top_override());
    }

    #[test]
    fn test_caller_facts_not_mutated() {
        let facts = FactSet::new().with(Feature::Spo2, Category::Severe);
        let before = facts.clone();
        let eval = RuleEngine::with_default_rules().evaluate(&facts);
        assert_eq!(facts, before);
        assert_eq!(eval.final_facts.observed(), &before);
    }

    #[test]
    fn test_missing_keys_default_unknown() {
        let e = engine(vec![Rule::new(
            "unknown_spo2",
            Consequent::RaiseFloor(SeverityLevel::Green),
            1,
        )
        .when(Feature::Spo2, Category::Unknown)]);
        let eval = e.evaluate(&FactSet::new());
        assert_eq!(eval.floor, Some(SeverityLevel::Green));
    }

    #[test]
    fn test_fever_without_dyspnea_floor_green() {
        let facts = FactSet::new()
            .with(Feature::Temp, Category::High)
            .with(Feature::Dyspnea, Category::No)
            .with(Feature::AlteredConsciousness, Category::No);
        let eval = RuleEngine::with_default_rules().evaluate(&facts);
        assert_eq!(eval.floor, Some(SeverityLevel::Green));
        assert_eq!(eval.hard_severity, None);
    }

    fn any_category_for(feature: Feature) -> impl Strategy<Value = Category> {
        let cats = feature.categories().to_vec();
        (0..cats.len()).prop_map(move |i| cats[i])
    }

    fn any_facts() -> impl Strategy<Value = FactSet> {
        (
            any_category_for(Feature::Spo2),
            any_category_for(Feature::Sbp),
            any_category_for(Feature::Rr),
            any_category_for(Feature::Temp),
            any_category_for(Feature::ChestPain),
            any_category_for(Feature::Dyspnea),
            any_category_for(Feature::AlteredConsciousness),
            any_category_for(Feature::MajorTrauma),
            any_category_for(Feature::MassiveBleeding),
        )
            .prop_map(|(a, b, c, d, e, f, g, h, i)| {
                FactSet::new()
                    .with(Feature::Spo2, a)
                    .with(Feature::Sbp, b)
                    .with(Feature::Rr, c)
                    .with(Feature::Temp, d)
                    .with(Feature::ChestPain, e)
                    .with(Feature::Dyspnea, f)
                    .with(Feature::AlteredConsciousness, g)
                    .with(Feature::MajorTrauma, h)
                    .with(Feature::MassiveBleeding, i)
            })
    }

    proptest! {
        #[test]
        fn prop_each_rule_fires_at_most_once(facts in any_facts()) {
            let engine = RuleEngine::with_default_rules();
            let eval = engine.evaluate(&facts);
            let mut seen = std::collections::HashSet::new();
            for id in &eval.fired {
                prop_assert!(seen.insert(id.clone()));
            }
            prop_assert!(eval.fired.len() <= engine.rules().len());
        }

        #[test]
        fn prop_evaluation_is_deterministic(facts in any_facts()) {
            let engine = RuleEngine::with_default_rules();
            prop_assert_eq!(engine.evaluate(&facts), engine.evaluate(&facts));
        }

        #[test]
        fn prop_fired_priorities_non_increasing_without_chaining(facts in any_facts()) {
            // The default knowledge base has no chaining conditions, so the
            // eligible set only shrinks and priorities never increase.
            let engine = RuleEngine::with_default_rules();
            let eval = engine.evaluate(&facts);
            let priorities: Vec<i32> = eval
                .fired
                .iter()
                .filter_map(|id| engine.rules().get(id.as_str()).map(|r| r.priority))
                .collect();
            prop_assert!(priorities.windows(2).all(|w| w[0] >= w[1]));
        }
    }
}
