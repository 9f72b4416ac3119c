use serde::Serialize;

use triage_core::{SeverityLevel, SEVERITY_LEVEL_COUNT};

use super::dataset::Sample;
use super::model::NaiveBayesModel;
use crate::error::EstimatorError;
use crate::estimator::PosteriorEstimator;

/// Counts of `(truth, predicted)` pairs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConfusionMatrix {
    counts: [[usize; SEVERITY_LEVEL_COUNT]; SEVERITY_LEVEL_COUNT],
}

impl ConfusionMatrix {
    /// Empty matrix.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one prediction.
    pub fn record(&mut self, truth: SeverityLevel, predicted: SeverityLevel) {
        self.counts[truth.rank()][predicted.rank()] += 1;
    }

    /// Cases with this `(truth, predicted)` pair.
    pub fn count(&self, truth: SeverityLevel, predicted: SeverityLevel) -> usize {
        self.counts[truth.rank()][predicted.rank()]
    }

    /// All recorded cases.
    pub fn total(&self) -> usize {
        self.counts.iter().flatten().sum()
    }

    /// Cases on the diagonal.
    pub fn correct(&self) -> usize {
        SeverityLevel::ALL.into_iter().map(|l| self.count(l, l)).sum()
    }

    /// Cases predicted less severe than their truth.
    pub fn under_triaged(&self) -> usize {
        SeverityLevel::ALL
            .into_iter()
            .flat_map(|t| SeverityLevel::ALL.into_iter().map(move |p| (t, p)))
            .filter(|(t, p)| p < t)
            .map(|(t, p)| self.count(t, p))
            .sum()
    }

    /// Fraction correct, `None` when empty.
    pub fn accuracy(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            n => Some(self.correct() as f64 / n as f64),
        }
    }

    /// Fraction of `level` cases predicted as `level`, `None` when the
    /// class never occurs.
    pub fn recall(&self, level: SeverityLevel) -> Option<f64> {
        let row: usize = self.counts[level.rank()].iter().sum();
        (row > 0).then(|| self.count(level, level) as f64 / row as f64)
    }
}

impl std::fmt::Display for ConfusionMatrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>8}", "truth\\pred")?;
        for p in SeverityLevel::ALL {
            write!(f, " {:>7}", p.as_str())?;
        }
        writeln!(f)?;
        for t in SeverityLevel::ALL {
            write!(f, "{:>10}", t.as_str())?;
            for p in SeverityLevel::ALL {
                write!(f, " {:>7}", self.count(t, p))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Score an estimator's MAP predictions against labelled samples.
pub fn evaluate(
    estimator: &dyn PosteriorEstimator,
    samples: &[Sample],
) -> Result<ConfusionMatrix, EstimatorError> {
    let mut matrix = ConfusionMatrix::new();
    for s in samples {
        let predicted = estimator.posterior(&s.facts)?.map_class();
        matrix.record(s.label, predicted);
    }
    Ok(matrix)
}

impl NaiveBayesModel {
    /// [`evaluate`] with this model as the estimator.
    pub fn evaluate(&self, samples: &[Sample]) -> Result<ConfusionMatrix, EstimatorError> {
        evaluate(self, samples)
    }
}
