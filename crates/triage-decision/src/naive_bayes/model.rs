use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use triage_core::{Category, FactSet, Feature, SeverityLevel, SEVERITY_LEVEL_COUNT};

use crate::error::{EstimatorError, ModelError};
use crate::estimator::PosteriorEstimator;
use crate::posterior::{Posterior, POSTERIOR_TOLERANCE};

/// Schema version this build reads and writes.
pub const MODEL_SCHEMA_VERSION: u32 = 1;

/// Per-feature category likelihoods for one class.
pub type LikelihoodTable = BTreeMap<Feature, BTreeMap<Category, f64>>;

/// Class priors and per-class categorical likelihoods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NaiveBayesModel {
    pub(crate) schema_version: u32,
    pub(crate) alpha: f64,
    pub(crate) class_weighted: bool,
    pub(crate) trained_on: usize,
    pub(crate) priors: BTreeMap<SeverityLevel, f64>,
    pub(crate) likelihoods: BTreeMap<SeverityLevel, LikelihoodTable>,
}

impl NaiveBayesModel {
    /// Build a model directly from probability tables and validate it.
    pub fn from_tables(
        priors: BTreeMap<SeverityLevel, f64>,
        likelihoods: BTreeMap<SeverityLevel, LikelihoodTable>,
    ) -> Result<Self, ModelError> {
        let model = Self {
            schema_version: MODEL_SCHEMA_VERSION,
            alpha: 0.0,
            class_weighted: false,
            trained_on: 0,
            priors,
            likelihoods,
        };
        model.validate()?;
        Ok(model)
    }

    /// Prior probability of `level`.
    pub fn prior(&self, level: SeverityLevel) -> f64 {
        self.priors.get(&level).copied().unwrap_or(0.0)
    }

    /// `P(feature = category | level)`, zero when the class is untrained.
    pub fn likelihood(&self, level: SeverityLevel, feature: Feature, category: Category) -> f64 {
        self.likelihoods
            .get(&level)
            .and_then(|t| t.get(&feature))
            .and_then(|t| t.get(&category))
            .copied()
            .unwrap_or(0.0)
    }

    /// Number of samples the model was fitted on.
    pub fn trained_on(&self) -> usize {
        self.trained_on
    }

    /// Classes with a non-zero prior.
    pub fn classes(&self) -> Vec<SeverityLevel> {
        SeverityLevel::ALL
            .into_iter()
            .filter(|l| self.prior(*l) > 0.0)
            .collect()
    }

    /// Check schema version and every probability table.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.schema_version != MODEL_SCHEMA_VERSION {
            return Err(ModelError::SchemaVersion {
                found: self.schema_version,
                expected: MODEL_SCHEMA_VERSION,
            });
        }

        let mut prior_sum = 0.0;
        for level in SeverityLevel::ALL {
            let p = *self.priors.get(&level).ok_or_else(|| invalid(
                "priors",
                format!("missing entry for {level}"),
            ))?;
            check_probability("priors", level.as_str(), p)?;
            prior_sum += p;
        }
        check_sum("priors", prior_sum)?;

        for level in self.classes() {
            let table = self.likelihoods.get(&level).ok_or_else(|| invalid(
                "likelihoods",
                format!("class {level} has a prior but no likelihood table"),
            ))?;
            for feature in Feature::ALL {
                let context = format!("likelihoods[{level}][{feature}]");
                let row = table
                    .get(&feature)
                    .ok_or_else(|| invalid(&context, "missing feature table".to_string()))?;
                if let Some(extra) = row.keys().find(|c| !feature.accepts(**c)) {
                    return Err(invalid(&context, format!("category {extra} not valid here")));
                }
                let mut sum = 0.0;
                for category in feature.categories() {
                    let p = *row
                        .get(category)
                        .ok_or_else(|| invalid(&context, format!("missing category {category}")))?;
                    check_probability(&context, category.as_str(), p)?;
                    sum += p;
                }
                check_sum(&context, sum)?;
            }
        }
        Ok(())
    }

    /// Read and validate a model file.
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let model: Self = serde_json::from_str(&text).map_err(|source| ModelError::Json {
            path: path.display().to_string(),
            source,
        })?;
        model.validate()?;
        tracing::info!(
            path = %path.display(),
            trained_on = model.trained_on,
            classes = model.classes().len(),
            "naive Bayes model loaded"
        );
        Ok(model)
    }

    /// Write the model as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        let json = serde_json::to_string_pretty(self).map_err(|source| ModelError::Json {
            path: path.display().to_string(),
            source,
        })?;
        std::fs::write(path, json).map_err(|source| ModelError::Io {
            path: path.display().to_string(),
            source,
        })?;
        tracing::info!(path = %path.display(), "naive Bayes model saved");
        Ok(())
    }
}

impl PosteriorEstimator for NaiveBayesModel {
    fn name(&self) -> &str {
        "naive_bayes"
    }

    fn posterior(&self, facts: &FactSet) -> Result<Posterior, EstimatorError> {
        let mut log_scores = [f64::NEG_INFINITY; SEVERITY_LEVEL_COUNT];
        for level in self.classes() {
            let mut score = self.prior(level).ln();
            for (feature, category) in facts.iter() {
                score += self.likelihood(level, feature, category).ln();
            }
            log_scores[level.rank()] = score;
        }

        let max = log_scores
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        if !max.is_finite() {
            return Err(EstimatorError::Failed(
                "no class has non-zero likelihood for these facts".to_string(),
            ));
        }

        let weights = log_scores.map(|s| (s - max).exp());
        let total: f64 = weights.iter().sum();
        Ok(Posterior::from_array(weights.map(|w| w / total))?)
    }
}

fn invalid(context: &str, message: String) -> ModelError {
    ModelError::InvalidProbabilities {
        context: context.to_string(),
        message,
    }
}

fn check_probability(context: &str, key: &str, p: f64) -> Result<(), ModelError> {
    if p.is_finite() && (0.0..=1.0).contains(&p) {
        Ok(())
    } else {
        Err(invalid(context, format!("{key} = {p} is not a probability")))
    }
}

fn check_sum(context: &str, sum: f64) -> Result<(), ModelError> {
    if (sum - 1.0).abs() <= POSTERIOR_TOLERANCE {
        Ok(())
    } else {
        Err(invalid(context, format!("sums to {sum}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform_table() -> LikelihoodTable {
        Feature::ALL
            .into_iter()
            .map(|f| {
                let cats = f.categories();
                let p = 1.0 / cats.len() as f64;
                (f, cats.iter().map(|c| (*c, p)).collect())
            })
            .collect()
    }

    fn two_class_model() -> NaiveBayesModel {
        let priors = [
            (SeverityLevel::White, 0.0),
            (SeverityLevel::Green, 0.5),
            (SeverityLevel::Yellow, 0.5),
            (SeverityLevel::Red, 0.0),
        ]
        .into_iter()
        .collect();
        let mut yellow = uniform_table();
        yellow.insert(
            Feature::Dyspnea,
            [(Category::Yes, 0.8), (Category::No, 0.1), (Category::Unknown, 0.1)]
                .into_iter()
                .collect(),
        );
        let likelihoods = [
            (SeverityLevel::Green, uniform_table()),
            (SeverityLevel::Yellow, yellow),
        ]
        .into_iter()
        .collect();
        NaiveBayesModel::from_tables(priors, likelihoods).unwrap()
    }

    #[test]
    fn test_absent_classes_get_zero() {
        let model = two_class_model();
        let p = model.posterior(&FactSet::new()).unwrap();
        assert_eq!(p.probability(SeverityLevel::White), 0.0);
        assert_eq!(p.probability(SeverityLevel::Red), 0.0);
        assert_eq!(model.classes(), vec![SeverityLevel::Green, SeverityLevel::Yellow]);
    }

    #[test]
    fn test_posterior_follows_likelihoods() {
        let model = two_class_model();
        let facts = FactSet::new().with(Feature::Dyspnea, Category::Yes);
        let p = model.posterior(&facts).unwrap();
        // green: 0.5 * 1/3, yellow: 0.5 * 0.8 (other features cancel)
        let expected_yellow = 0.8 / (0.8 + 1.0 / 3.0);
        assert!((p.probability(SeverityLevel::Yellow) - expected_yellow).abs() < 1e-9);
        assert_eq!(p.map_class(), SeverityLevel::Yellow);
    }

    #[test]
    fn test_validate_rejects_bad_sum() {
        let mut model = two_class_model();
        model
            .likelihoods
            .get_mut(&SeverityLevel::Green)
            .unwrap()
            .get_mut(&Feature::Spo2)
            .unwrap()
            .insert(Category::Ok, 0.9);
        let err = model.validate().unwrap_err();
        assert!(matches!(err, ModelError::InvalidProbabilities { ref context, .. } if context == "likelihoods[green][spo2]"));
    }

    #[test]
    fn test_validate_rejects_missing_table() {
        let mut model = two_class_model();
        model.likelihoods.remove(&SeverityLevel::Yellow);
        assert!(matches!(
            model.validate(),
            Err(ModelError::InvalidProbabilities { .. })
        ));
    }

    #[test]
    fn test_validate_rejects_foreign_category() {
        let mut model = two_class_model();
        model
            .likelihoods
            .get_mut(&SeverityLevel::Green)
            .unwrap()
            .get_mut(&Feature::Dyspnea)
            .unwrap()
            .insert(Category::Severe, 0.0);
        assert!(model.validate().is_err());
    }

    #[test]
    fn test_schema_version_checked_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let mut model = two_class_model();
        model.schema_version = 99;
        std::fs::write(&path, serde_json::to_string(&model).unwrap()).unwrap();
        assert!(matches!(
            NaiveBayesModel::load(&path),
            Err(ModelError::SchemaVersion { found: 99, expected: 1 })
        ));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        let model = two_class_model();
        model.save(&path).unwrap();
        let loaded = NaiveBayesModel::load(&path).unwrap();
        assert_eq!(loaded.classes(), model.classes());
        let facts = FactSet::new().with(Feature::Dyspnea, Category::Yes);
        let (a, b) = (
            loaded.posterior(&facts).unwrap(),
            model.posterior(&facts).unwrap(),
        );
        for level in SeverityLevel::ALL {
            assert!((a.probability(level) - b.probability(level)).abs() < 1e-12);
        }
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(NaiveBayesModel::load(&path), Err(ModelError::Json { .. })));
    }

    #[test]
    fn test_zero_likelihood_everywhere_is_an_error() {
        let mut table = uniform_table();
        table.insert(
            Feature::Temp,
            [(Category::High, 1.0), (Category::Ok, 0.0), (Category::Unknown, 0.0)]
                .into_iter()
                .collect(),
        );
        let priors = [
            (SeverityLevel::White, 0.0),
            (SeverityLevel::Green, 1.0),
            (SeverityLevel::Yellow, 0.0),
            (SeverityLevel::Red, 0.0),
        ]
        .into_iter()
        .collect();
        let model = NaiveBayesModel::from_tables(
            priors,
            [(SeverityLevel::Green, table)].into_iter().collect(),
        )
        .unwrap();
        assert!(matches!(
            model.posterior(&FactSet::new()),
            Err(EstimatorError::Failed(_))
        ));
    }
}
