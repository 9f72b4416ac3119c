//! # Posterior Distributions
//!
//! A [`Posterior`] is a probability for every severity level. It is
//! validated on construction: every entry finite and within `[0, 1]`,
//! every level present, and the sum within [`POSTERIOR_TOLERANCE`] of
//! one. A value of this type is therefore always a usable input to the
//! decider.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize, Serializer};

use triage_core::{SeverityLevel, SEVERITY_LEVEL_COUNT};

use crate::error::PosteriorError;

/// Maximum allowed deviation of the probability sum from one.
pub const POSTERIOR_TOLERANCE: f64 = 1e-6;

/// Validated distribution over [`SeverityLevel`].
///
/// Serializes as a map keyed by level name.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "BTreeMap<SeverityLevel, f64>")]
pub struct Posterior {
    probs: [f64; SEVERITY_LEVEL_COUNT],
}

impl Posterior {
    /// Validate probabilities indexed by [`SeverityLevel::rank`].
    pub fn from_array(probs: [f64; SEVERITY_LEVEL_COUNT]) -> Result<Self, PosteriorError> {
        for level in SeverityLevel::ALL {
            let value = probs[level.rank()];
            if !value.is_finite() {
                return Err(PosteriorError::NonFinite { level, value });
            }
            if !(0.0..=1.0).contains(&value) {
                return Err(PosteriorError::OutOfRange { level, value });
            }
        }
        let sum: f64 = probs.iter().sum();
        if (sum - 1.0).abs() > POSTERIOR_TOLERANCE {
            return Err(PosteriorError::SumOutOfTolerance {
                sum,
                tolerance: POSTERIOR_TOLERANCE,
            });
        }
        Ok(Self { probs })
    }

    /// Validate a level → probability map. Every level must be present.
    pub fn from_map(map: &BTreeMap<SeverityLevel, f64>) -> Result<Self, PosteriorError> {
        let mut probs = [0.0; SEVERITY_LEVEL_COUNT];
        for level in SeverityLevel::ALL {
            probs[level.rank()] = *map
                .get(&level)
                .ok_or(PosteriorError::MissingClass(level))?;
        }
        Self::from_array(probs)
    }

    /// All mass on `level`.
    pub fn degenerate(level: SeverityLevel) -> Self {
        let mut probs = [0.0; SEVERITY_LEVEL_COUNT];
        probs[level.rank()] = 1.0;
        Self { probs }
    }

    /// Probability of `level`.
    pub fn probability(&self, level: SeverityLevel) -> f64 {
        self.probs[level.rank()]
    }

    /// The most probable level. Ties go to the least severe.
    pub fn map_class(&self) -> SeverityLevel {
        let mut best = SeverityLevel::BOTTOM;
        for level in SeverityLevel::ALL {
            if self.probability(level) > self.probability(best) {
                best = level;
            }
        }
        best
    }

    /// `(level, probability)` pairs, least severe first.
    pub fn iter(&self) -> impl Iterator<Item = (SeverityLevel, f64)> + '_ {
        SeverityLevel::ALL
            .into_iter()
            .map(move |l| (l, self.probability(l)))
    }

    /// Probabilities indexed by rank.
    pub fn as_array(&self) -> &[f64; SEVERITY_LEVEL_COUNT] {
        &self.probs
    }
}

impl TryFrom<BTreeMap<SeverityLevel, f64>> for Posterior {
    type Error = PosteriorError;

    fn try_from(map: BTreeMap<SeverityLevel, f64>) -> Result<Self, Self::Error> {
        Self::from_map(&map)
    }
}

impl Serialize for Posterior {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let map: BTreeMap<SeverityLevel, f64> = self.iter().collect();
        map.serialize(serializer)
    }
}

impl std::fmt::Display for Posterior {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = SeverityLevel::descending()
            .map(|l| format!("{l}={:.3}", self.probability(l)))
            .collect();
        f.write_str(&parts.join(" "))
    }
}
