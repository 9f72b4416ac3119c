//! # Configuration
//!
//! `triage.yaml` (or the file given with `--config`). Every field is
//! optional; an absent file means built-in defaults.
//!
//! ```yaml
//! policy:
//!   evidence_threshold: 0.20
//!   confidence_margin: 0.40
//! cost_overrides:
//!   - { truth: red, predicted: yellow, cost: 150 }
//! thresholds:
//!   temp_high_min: 38.5
//! rules: rules/triage.yaml
//! model: data/nb_model.json
//! ```
//!
//! Relative `rules` and `model` paths resolve against the config file's
//! directory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use triage_core::{NormalizerThresholds, ThresholdNormalizer};
use triage_decision::{
    CostEntry, CostMatrix, CostSensitiveDecider, DecisionFuser, DecisionPolicy, NaiveBayesModel,
};
use triage_rules::{default_knowledge_base, RuleEngine, RuleSet};

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TriageConfig {
    /// Guardrail and override thresholds.
    pub policy: DecisionPolicy,
    /// Cells replacing the default cost matrix.
    pub cost_overrides: Vec<CostEntry>,
    /// Vital-sign discretization cut points.
    pub thresholds: NormalizerThresholds,
    /// Rule set file; the built-in knowledge base when absent.
    pub rules: Option<PathBuf>,
    /// Trained model file; without one, only rule-settled cases classify.
    pub model: Option<PathBuf>,
}

impl TriageConfig {
    /// Parse a YAML document. Relative paths stay relative.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("invalid configuration")
    }

    /// Load `path` and resolve relative paths against its directory.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config = Self::from_yaml_str(&text)
            .with_context(|| format!("in config {}", path.display()))?;
        if let Some(base) = path.parent() {
            config.rules = config.rules.map(|p| base.join(p));
            config.model = config.model.map(|p| base.join(p));
        }
        tracing::debug!(path = %path.display(), "configuration loaded");
        Ok(config)
    }

    /// [`load`](Self::load) when a path is given, defaults otherwise.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }

    /// Rule set from `rules`, or the built-in knowledge base.
    pub fn rule_set(&self) -> Result<RuleSet> {
        match &self.rules {
            Some(path) => RuleSet::load(path)
                .with_context(|| format!("failed to load rule set {}", path.display())),
            None => Ok(default_knowledge_base()),
        }
    }

    /// Decider over the default matrix with overrides applied.
    pub fn decider(&self) -> Result<CostSensitiveDecider> {
        let costs = CostMatrix::default()
            .with_overrides(&self.cost_overrides)
            .context("invalid cost_overrides")?;
        CostSensitiveDecider::new(costs, self.policy).context("invalid policy")
    }

    /// Normalizer over the configured thresholds.
    pub fn normalizer(&self) -> ThresholdNormalizer {
        ThresholdNormalizer::new(self.thresholds.clone())
    }

    /// Fuser wired from this configuration. `model_override` takes
    /// precedence over `model`.
    pub fn fuser(&self, model_override: Option<&Path>) -> Result<DecisionFuser> {
        let engine = RuleEngine::new(Arc::new(self.rule_set()?));
        let fuser = DecisionFuser::new(engine, self.decider()?);
        let model_path = model_override.or(self.model.as_deref());
        match model_path {
            Some(path) => {
                let model = NaiveBayesModel::load(path)
                    .with_context(|| format!("failed to load model {}", path.display()))?;
                Ok(fuser.with_estimator(Arc::new(model)))
            }
            None => {
                tracing::warn!("no model configured; only rule-settled cases can be classified");
                Ok(fuser)
            }
        }
    }
}
