//! # Rule Sets
//!
//! An ordered, validated collection of rules. Declaration order is the
//! last conflict-resolution tie-break, so it is preserved exactly as
//! loaded.
//!
//! Rule sets are data. They load from YAML or JSON documents of the form
//! `{ rules: [ ... ] }`, are validated once (unique, non-empty ids), and
//! are shared read-only behind an `Arc` thereafter.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use triage_core::{Category, Feature, SeverityLevel};

use crate::error::RuleSetError;
use crate::rule::{Consequent, Rule};

/// On-disk shape of a rule set.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RuleSetDocument {
    rules: Vec<Rule>,
}

/// Ordered rules with unique identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RuleSetDocument", into = "RuleSetDocument")]
pub struct RuleSet {
    rules: Vec<Rule>,
}

impl TryFrom<RuleSetDocument> for RuleSet {
    type Error = RuleSetError;

    fn try_from(doc: RuleSetDocument) -> Result<Self, Self::Error> {
        Self::new(doc.rules)
    }
}

impl From<RuleSet> for RuleSetDocument {
    fn from(set: RuleSet) -> Self {
        Self { rules: set.rules }
    }
}

impl RuleSet {
    /// Validate and wrap `rules`, keeping their order.
    pub fn new(rules: Vec<Rule>) -> Result<Self, RuleSetError> {
        let mut seen = HashSet::with_capacity(rules.len());
        for (position, rule) in rules.iter().enumerate() {
            if rule.id.as_str().trim().is_empty() {
                return Err(RuleSetError::EmptyId(position));
            }
            if !seen.insert(rule.id.as_str()) {
                return Err(RuleSetError::DuplicateId(rule.id.to_string()));
            }
        }
        Ok(Self { rules })
    }

    /// Parse a YAML rule document.
    pub fn from_yaml_str(text: &str) -> Result<Self, RuleSetError> {
        serde_yaml::from_str(text).map_err(|e| RuleSetError::Parse {
            format: "yaml",
            message: e.to_string(),
        })
    }

    /// Parse a JSON rule document.
    pub fn from_json_str(text: &str) -> Result<Self, RuleSetError> {
        serde_json::from_str(text).map_err(|e| RuleSetError::Parse {
            format: "json",
            message: e.to_string(),
        })
    }

    /// Load a rule set from disk. `.json` files parse as JSON, anything
    /// else as YAML. Lint findings are logged, never fatal.
    pub fn load(path: &Path) -> Result<Self, RuleSetError> {
        let text = std::fs::read_to_string(path).map_err(|source| RuleSetError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let set = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_yaml_str(&text)?
        };

        for finding in set.lint() {
            tracing::warn!(
                path = %path.display(),
                rule_id = %finding.rule_id,
                "{}",
                finding.kind
            );
        }
        tracing::info!(path = %path.display(), rules = set.len(), "rule set loaded");
        Ok(set)
    }

    /// Serialize as a YAML document accepted by [`from_yaml_str`](Self::from_yaml_str).
    pub fn to_yaml_string(&self) -> Result<String, RuleSetError> {
        serde_yaml::to_string(self).map_err(|e| RuleSetError::Parse {
            format: "yaml",
            message: e.to_string(),
        })
    }

    /// Rules in declaration order.
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Look up a rule by id.
    pub fn get(&self, id: &str) -> Option<&Rule> {
        self.rules.iter().find(|r| r.id.as_str() == id)
    }

    /// Iterate in declaration order.
    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set has no rules.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

impl<'a> IntoIterator for &'a RuleSet {
    type Item = &'a Rule;
    type IntoIter = std::slice::Iter<'a, Rule>;

    fn into_iter(self) -> Self::IntoIter {
        self.rules.iter()
    }
}

/// The built-in knowledge base.
///
/// | Id | Antecedent | Consequent | Priority |
/// |----|-----------|------------|----------|
/// | `CRIT_SPO2` | spo2 = severe | red | 100 |
/// | `CRIT_SBP` | sbp = severe | red | 100 |
/// | `CRIT_ALTERED_CONSCIOUSNESS` | altered_consciousness = yes | red | 100 |
/// | `CRIT_MAJOR_TRAUMA` | major_trauma = yes | red | 100 |
/// | `CRIT_MASSIVE_BLEEDING` | massive_bleeding = yes | red | 100 |
/// | `MIN_CHEST_PAIN_DYSPNEA` | chest_pain = yes, dyspnea = yes | >= yellow | 50 |
/// | `MIN_TACHYPNEA_DYSPNEA` | rr = high, dyspnea = yes | >= yellow | 50 |
/// | `MIN_FEVER_NO_DYSPNEA` | temp = high, dyspnea = no, altered_consciousness = no | >= green | 20 |
pub fn default_knowledge_base() -> RuleSet {
    let red = Consequent::HardAssign(SeverityLevel::Red);
    let rules = vec![
        Rule::new("CRIT_SPO2", red, 100)
            .when(Feature::Spo2, Category::Severe)
            .described("Severe hypoxaemia"),
        Rule::new("CRIT_SBP", red, 100)
            .when(Feature::Sbp, Category::Severe)
            .described("Hypotension, possible shock"),
        Rule::new("CRIT_ALTERED_CONSCIOUSNESS", red, 100)
            .when(Feature::AlteredConsciousness, Category::Yes)
            .described("Altered level of consciousness"),
        Rule::new("CRIT_MAJOR_TRAUMA", red, 100)
            .when(Feature::MajorTrauma, Category::Yes)
            .described("Major trauma mechanism"),
        Rule::new("CRIT_MASSIVE_BLEEDING", red, 100)
            .when(Feature::MassiveBleeding, Category::Yes)
            .described("Massive external bleeding"),
        Rule::new(
            "MIN_CHEST_PAIN_DYSPNEA",
            Consequent::RaiseFloor(SeverityLevel::Yellow),
            50,
        )
        .when(Feature::ChestPain, Category::Yes)
        .when(Feature::Dyspnea, Category::Yes)
        .described("Chest pain with dyspnea: at least yellow"),
        Rule::new(
            "MIN_TACHYPNEA_DYSPNEA",
            Consequent::RaiseFloor(SeverityLevel::Yellow),
            50,
        )
        .when(Feature::Rr, Category::High)
        .when(Feature::Dyspnea, Category::Yes)
        .described("Tachypnoea with dyspnea: at least yellow"),
        Rule::new(
            "MIN_FEVER_NO_DYSPNEA",
            Consequent::RaiseFloor(SeverityLevel::Green),
            20,
        )
        .when(Feature::Temp, Category::High)
        .when(Feature::Dyspnea, Category::No)
        .when(Feature::AlteredConsciousness, Category::No)
        .described("High fever without respiratory or neurological signs: at least green"),
    ];
    // Ids above are distinct literals; covered by test_default_knowledge_base_shape.
    RuleSet { rules }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_knowledge_base_shape() {
        let kb = default_knowledge_base();
        assert_eq!(kb.len(), 8);
        let hard: Vec<_> = kb.iter().filter(|r| r.then.is_hard()).collect();
        assert_eq!(hard.len(), 5);
        assert!(hard
            .iter()
            .all(|r| r.priority == 100 && r.then.severity().is_top()));
        assert_eq!(
            kb.get("MIN_FEVER_NO_DYSPNEA").map(|r| r.then),
            Some(Consequent::RaiseFloor(SeverityLevel::Green))
        );
        assert!(kb.lint().is_empty());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let rule = Rule::new("A", Consequent::RaiseFloor(SeverityLevel::Green), 1)
            .when(Feature::Temp, Category::High);
        let err = RuleSet::new(vec![rule.clone(), rule]).unwrap_err();
        assert!(matches!(err, RuleSetError::DuplicateId(id) if id == "A"));
    }

    #[test]
    fn test_empty_id_rejected() {
        let rule = Rule::new(" ", Consequent::RaiseFloor(SeverityLevel::Green), 1);
        assert!(matches!(
            RuleSet::new(vec![rule]),
            Err(RuleSetError::EmptyId(0))
        ));
    }

    #[test]
    fn test_yaml_roundtrip_preserves_order() {
        let kb = default_knowledge_base();
        let yaml = kb.to_yaml_string().unwrap();
        let back = RuleSet::from_yaml_str(&yaml).unwrap();
        assert_eq!(back, kb);
    }

    #[test]
    fn test_duplicate_id_rejected_at_parse() {
        let yaml = r#"
rules:
  - { id: X, all: [{ feature: temp, value: high }], then: { raise_floor: green } }
  - { id: X, all: [{ feature: rr, value: high }], then: { raise_floor: green } }
"#;
        let err = RuleSet::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, RuleSetError::Parse { format: "yaml", .. }));
        assert!(err.to_string().contains("duplicate rule id"));
    }

    #[test]
    fn test_json_document() {
        let json = r#"{"rules":[{"id":"J","all":[{"feature":"sbp","value":"severe"}],"then":{"hard_assign":"red"},"priority":100}]}"#;
        let set = RuleSet::from_json_str(json).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set.rules()[0].priority, 100);
    }

    #[test]
    fn test_unknown_consequent_rejected() {
        let yaml = "rules:\n  - { id: X, then: { lower_to: green } }\n";
        assert!(RuleSet::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_load_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("rules.yaml");
        std::fs::write(&yaml_path, default_knowledge_base().to_yaml_string().unwrap()).unwrap();
        assert_eq!(RuleSet::load(&yaml_path).unwrap().len(), 8);

        let json_path = dir.path().join("rules.json");
        let mut f = std::fs::File::create(&json_path).unwrap();
        write!(f, "{}", serde_json::to_string(&default_knowledge_base()).unwrap()).unwrap();
        drop(f);
        assert_eq!(RuleSet::load(&json_path).unwrap().len(), 8);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = RuleSet::load(&dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, RuleSetError::Io { .. }));
    }
}
