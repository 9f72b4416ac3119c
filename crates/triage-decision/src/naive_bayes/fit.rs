use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use triage_core::{Feature, SeverityLevel, SEVERITY_LEVEL_COUNT};

use super::dataset::Sample;
use super::model::{LikelihoodTable, NaiveBayesModel, MODEL_SCHEMA_VERSION};
use crate::error::ModelError;

/// Training options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Laplace smoothing pseudo-count added to every category.
    pub alpha: f64,
    /// Weight each class inversely to its frequency so rare severe cases
    /// are not swamped by common mild ones.
    pub class_weighted: bool,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            class_weighted: true,
        }
    }
}

impl NaiveBayesModel {
    /// Fit priors and likelihoods from labelled samples.
    ///
    /// With `class_weighted`, a class with `n_c` of `N` samples among `K`
    /// present classes gets weight `N / (K · n_c)`.
    pub fn fit(samples: &[Sample], options: FitOptions) -> Result<Self, ModelError> {
        if samples.is_empty() {
            return Err(ModelError::EmptyDataset);
        }
        if !options.alpha.is_finite() || options.alpha < 0.0 {
            return Err(ModelError::InvalidOption {
                name: "alpha",
                message: format!("must be a non-negative finite number, got {}", options.alpha),
            });
        }

        let mut class_counts = [0usize; SEVERITY_LEVEL_COUNT];
        for s in samples {
            class_counts[s.label.rank()] += 1;
        }
        let present = class_counts.iter().filter(|n| **n > 0).count();
        let total = samples.len() as f64;
        let weights = class_counts.map(|n| match (n, options.class_weighted) {
            (0, _) => 0.0,
            (n, true) => total / (present as f64 * n as f64),
            (_, false) => 1.0,
        });

        let weighted_total: f64 = SeverityLevel::ALL
            .into_iter()
            .map(|l| weights[l.rank()] * class_counts[l.rank()] as f64)
            .sum();
        let priors: BTreeMap<SeverityLevel, f64> = SeverityLevel::ALL
            .into_iter()
            .map(|l| {
                let mass = weights[l.rank()] * class_counts[l.rank()] as f64;
                (l, mass / weighted_total)
            })
            .collect();

        let mut likelihoods = BTreeMap::new();
        for level in SeverityLevel::ALL {
            let n = class_counts[level.rank()];
            if n == 0 {
                continue;
            }
            let w = weights[level.rank()];
            let members: Vec<&Sample> = samples.iter().filter(|s| s.label == level).collect();
            let mut table = LikelihoodTable::new();
            for feature in Feature::ALL {
                let categories = feature.categories();
                let denominator = w * n as f64 + options.alpha * categories.len() as f64;
                let row = categories
                    .iter()
                    .map(|category| {
                        let hits = members
                            .iter()
                            .filter(|s| s.facts.get(feature) == *category)
                            .count();
                        (*category, (w * hits as f64 + options.alpha) / denominator)
                    })
                    .collect();
                table.insert(feature, row);
            }
            likelihoods.insert(level, table);
        }

        let model = Self {
            schema_version: MODEL_SCHEMA_VERSION,
            alpha: options.alpha,
            class_weighted: options.class_weighted,
            trained_on: samples.len(),
            priors,
            likelihoods,
        };
        model.validate()?;
        tracing::info!(
            samples = samples.len(),
            classes = present,
            alpha = options.alpha,
            class_weighted = options.class_weighted,
            "naive Bayes model fitted"
        );
        Ok(model)
    }
}
