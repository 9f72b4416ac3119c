//! # Misclassification Costs
//!
//! `cost(truth, predicted)` is the penalty for assigning `predicted` to a
//! case whose correct level is `truth`.
//!
//! ## Invariants
//!
//! - Every cost is finite and non-negative.
//! - The diagonal is zero.
//! - Under-triage is strictly worse than the mirrored over-triage: for
//!   every `a > b`, `cost(a, b) > cost(b, a)`.
//!
//! The matrix is built once, validated, and shared read-only.

use serde::{Deserialize, Serialize};

use triage_core::{SeverityLevel, SEVERITY_LEVEL_COUNT};

use crate::error::CostMatrixError;
use crate::posterior::Posterior;

type Table = [[f64; SEVERITY_LEVEL_COUNT]; SEVERITY_LEVEL_COUNT];

/// A single `(truth, predicted) -> cost` entry, as written in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEntry {
    /// True class.
    pub truth: SeverityLevel,
    /// Predicted class.
    pub predicted: SeverityLevel,
    /// Penalty.
    pub cost: f64,
}

/// Validated asymmetric cost matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct CostMatrix {
    table: Table,
}

impl CostMatrix {
    /// Validate a table indexed `[truth.rank()][predicted.rank()]`.
    pub fn new(table: Table) -> Result<Self, CostMatrixError> {
        for truth in SeverityLevel::ALL {
            for predicted in SeverityLevel::ALL {
                let value = table[truth.rank()][predicted.rank()];
                if !value.is_finite() || value < 0.0 {
                    return Err(CostMatrixError::InvalidCost {
                        truth,
                        predicted,
                        value,
                    });
                }
                if truth == predicted && value != 0.0 {
                    return Err(CostMatrixError::NonZeroDiagonal {
                        level: truth,
                        value,
                    });
                }
            }
        }
        for truth in SeverityLevel::ALL {
            for predicted in SeverityLevel::ALL.into_iter().filter(|p| *p < truth) {
                let under = table[truth.rank()][predicted.rank()];
                let over = table[predicted.rank()][truth.rank()];
                if under <= over {
                    return Err(CostMatrixError::AsymmetryViolated {
                        truth,
                        predicted,
                        under,
                        over,
                    });
                }
            }
        }
        Ok(Self { table })
    }

    /// Copy of this matrix with `entries` replacing the matching cells,
    /// revalidated as a whole.
    pub fn with_overrides(&self, entries: &[CostEntry]) -> Result<Self, CostMatrixError> {
        let mut table = self.table;
        for e in entries {
            table[e.truth.rank()][e.predicted.rank()] = e.cost;
        }
        Self::new(table)
    }

    /// Penalty for predicting `predicted` when the truth is `truth`.
    pub fn cost(&self, truth: SeverityLevel, predicted: SeverityLevel) -> f64 {
        self.table[truth.rank()][predicted.rank()]
    }

    /// `Σ_t p(t) · cost(t, candidate)`.
    pub fn expected_cost(&self, posterior: &Posterior, candidate: SeverityLevel) -> f64 {
        posterior
            .iter()
            .map(|(truth, p)| p * self.cost(truth, candidate))
            .sum()
    }

    /// Expected cost of every candidate, indexed by rank.
    pub fn expected_costs(&self, posterior: &Posterior) -> [f64; SEVERITY_LEVEL_COUNT] {
        SeverityLevel::ALL.map(|candidate| self.expected_cost(posterior, candidate))
    }

    /// Every cell as a configuration entry, truth-major order.
    pub fn entries(&self) -> Vec<CostEntry> {
        SeverityLevel::ALL
            .into_iter()
            .flat_map(|truth| {
                SeverityLevel::ALL.into_iter().map(move |predicted| (truth, predicted))
            })
            .map(|(truth, predicted)| CostEntry {
                truth,
                predicted,
                cost: self.cost(truth, predicted),
            })
            .collect()
    }
}

impl Default for CostMatrix {
    /// Clinical defaults. Missing a red case is catastrophic, sending a
    /// white case to the red area merely wasteful.
    ///
    /// | truth \ predicted | white | green | yellow | red |
    /// |---|---|---|---|---|
    /// | **white** | 0 | 3 | 1 | 10 |
    /// | **green** | 4 | 0 | 5 | 8 |
    /// | **yellow** | 40 | 20 | 0 | 1 |
    /// | **red** | 500 | 200 | 100 | 0 |
    fn default() -> Self {
        Self {
            table: [
                [0.0, 3.0, 1.0, 10.0],
                [4.0, 0.0, 5.0, 8.0],
                [40.0, 20.0, 0.0, 1.0],
                [500.0, 200.0, 100.0, 0.0],
            ],
        }
    }
}
