use std::path::Path;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use triage_core::{FactSet, SeverityLevel};

use crate::error::ModelError;

/// One labelled training case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    /// Observed facts.
    pub facts: FactSet,
    /// Reference severity.
    pub label: SeverityLevel,
}

impl Sample {
    /// Labelled sample.
    pub fn new(facts: FactSet, label: SeverityLevel) -> Self {
        Self { facts, label }
    }
}

#[derive(Deserialize)]
struct RawSample {
    #[serde(default)]
    facts: FactSet,
    #[serde(default)]
    label: Option<String>,
}

/// Parse a JSON array of `{ "facts": {...}, "label": "red" }` rows.
///
/// Fact values are read leniently. Rows whose label is missing or not a
/// severity level are skipped with a warning.
pub fn parse_dataset(text: &str, origin: &str) -> Result<Vec<Sample>, ModelError> {
    let rows: Vec<RawSample> = serde_json::from_str(text).map_err(|source| ModelError::Json {
        path: origin.to_string(),
        source,
    })?;
    let total = rows.len();
    let samples: Vec<Sample> = rows
        .into_iter()
        .enumerate()
        .filter_map(|(row, raw)| {
            let label = raw.label.as_deref().unwrap_or_default();
            match label.parse::<SeverityLevel>() {
                Ok(label) => Some(Sample::new(raw.facts, label)),
                Err(e) => {
                    tracing::warn!(origin, row, error = %e, "skipping dataset row");
                    None
                }
            }
        })
        .collect();
    tracing::info!(origin, total, kept = samples.len(), "dataset parsed");
    Ok(samples)
}

/// Read a JSON dataset file. See [`parse_dataset`].
pub fn load_dataset(path: &Path) -> Result<Vec<Sample>, ModelError> {
    let text = std::fs::read_to_string(path).map_err(|source| ModelError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_dataset(&text, &path.display().to_string())
}

/// Deterministic shuffled split into `(train, holdout)`.
///
/// `fraction` of the samples (rounded) go to the holdout set, never all of
/// them. The same `seed` always yields the same split.
pub fn split_holdout(
    samples: &[Sample],
    fraction: f64,
    seed: u64,
) -> Result<(Vec<Sample>, Vec<Sample>), ModelError> {
    if !(0.0..1.0).contains(&fraction) {
        return Err(ModelError::InvalidOption {
            name: "holdout",
            message: format!("fraction must be within [0, 1), got {fraction}"),
        });
    }
    let mut order: Vec<usize> = (0..samples.len()).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));

    let holdout_len = ((samples.len() as f64) * fraction).round() as usize;
    let holdout_len = holdout_len.min(samples.len().saturating_sub(1));
    let (holdout_idx, train_idx) = order.split_at(holdout_len);

    let pick = |idx: &[usize]| idx.iter().map(|i| samples[*i].clone()).collect::<Vec<_>>();
    Ok((pick(train_idx), pick(holdout_idx)))
}
