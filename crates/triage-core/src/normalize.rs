//! # Feature Normalization
//!
//! Turns raw observations ([`Vitals`]) into a [`FactSet`]. Thresholds are
//! configuration ([`NormalizerThresholds`]), not engine logic: the rule
//! engine and the estimator only ever see categories.
//!
//! A missing measurement or an unanswered symptom question maps to
//! `unknown`. Non-finite measurements are treated as missing.

use serde::{Deserialize, Serialize};

use crate::facts::{Category, FactSet, Feature};

/// Raw observations for one case. Every field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Vitals {
    /// Oxygen saturation, percent.
    pub spo2: Option<f64>,
    /// Systolic blood pressure, mmHg.
    pub sbp: Option<f64>,
    /// Respiratory rate, breaths per minute.
    pub rr: Option<f64>,
    /// Body temperature, °C.
    pub temp: Option<f64>,
    /// Chest pain present.
    pub chest_pain: Option<bool>,
    /// Shortness of breath present.
    pub dyspnea: Option<bool>,
    /// Altered consciousness present.
    pub altered_consciousness: Option<bool>,
    /// Major trauma present.
    pub major_trauma: Option<bool>,
    /// Massive bleeding present.
    pub massive_bleeding: Option<bool>,
}

/// Discretization cut points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizerThresholds {
    /// SpO2 at or below this is `severe`.
    pub spo2_severe_max: f64,
    /// SpO2 at or below this (and above severe) is `moderate`.
    pub spo2_moderate_max: f64,
    /// SBP strictly below this is `severe`.
    pub sbp_severe_below: f64,
    /// RR at or above this is `high`.
    pub rr_high_min: f64,
    /// Temperature at or above this is `high`.
    pub temp_high_min: f64,
}

impl Default for NormalizerThresholds {
    fn default() -> Self {
        Self {
            spo2_severe_max: 90.0,
            spo2_moderate_max: 94.0,
            sbp_severe_below: 90.0,
            rr_high_min: 30.0,
            temp_high_min: 39.0,
        }
    }
}

/// Raw observations → fact set.
pub trait FeatureNormalizer: Send + Sync {
    /// Discretize `vitals` into closed-category facts.
    fn normalize(&self, vitals: &Vitals) -> FactSet;
}

/// Threshold-based normalizer.
#[derive(Debug, Clone, Default)]
pub struct ThresholdNormalizer {
    thresholds: NormalizerThresholds,
}

impl ThresholdNormalizer {
    /// Normalizer with custom cut points.
    pub fn new(thresholds: NormalizerThresholds) -> Self {
        Self { thresholds }
    }

    /// The configured cut points.
    pub fn thresholds(&self) -> &NormalizerThresholds {
        &self.thresholds
    }

    fn spo2(&self, value: Option<f64>) -> Category {
        match finite(value) {
            None => Category::Unknown,
            Some(v) if v <= self.thresholds.spo2_severe_max => Category::Severe,
            Some(v) if v <= self.thresholds.spo2_moderate_max => Category::Moderate,
            Some(_) => Category::Ok,
        }
    }

    fn sbp(&self, value: Option<f64>) -> Category {
        match finite(value) {
            None => Category::Unknown,
            Some(v) if v < self.thresholds.sbp_severe_below => Category::Severe,
            Some(_) => Category::Ok,
        }
    }

    fn at_or_above(value: Option<f64>, threshold: f64) -> Category {
        match finite(value) {
            None => Category::Unknown,
            Some(v) if v >= threshold => Category::High,
            Some(_) => Category::Ok,
        }
    }
}

impl FeatureNormalizer for ThresholdNormalizer {
    fn normalize(&self, vitals: &Vitals) -> FactSet {
        let t = &self.thresholds;
        FactSet::new()
            .with(Feature::Spo2, self.spo2(vitals.spo2))
            .with(Feature::Sbp, self.sbp(vitals.sbp))
            .with(Feature::Rr, Self::at_or_above(vitals.rr, t.rr_high_min))
            .with(Feature::Temp, Self::at_or_above(vitals.temp, t.temp_high_min))
            .with(Feature::ChestPain, tri_state(vitals.chest_pain))
            .with(Feature::Dyspnea, tri_state(vitals.dyspnea))
            .with(
                Feature::AlteredConsciousness,
                tri_state(vitals.altered_consciousness),
            )
            .with(Feature::MajorTrauma, tri_state(vitals.major_trauma))
            .with(Feature::MassiveBleeding, tri_state(vitals.massive_bleeding))
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

fn tri_state(answer: Option<bool>) -> Category {
    match answer {
        Some(true) => Category::Yes,
        Some(false) => Category::No,
        None => Category::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalize(vitals: Vitals) -> FactSet {
        ThresholdNormalizer::default().normalize(&vitals)
    }

    #[test]
    fn test_empty_vitals_all_unknown() {
        let facts = normalize(Vitals::default());
        assert_eq!(facts.known_count(), 0);
    }

    #[test]
    fn test_spo2_bands() {
        let cat = |v| normalize(Vitals { spo2: Some(v), ..Default::default() }).get(Feature::Spo2);
        assert_eq!(cat(88.0), Category::Severe);
        assert_eq!(cat(90.0), Category::Severe);
        assert_eq!(cat(92.0), Category::Moderate);
        assert_eq!(cat(94.0), Category::Moderate);
        assert_eq!(cat(97.0), Category::Ok);
    }

    #[test]
    fn test_sbp_boundary_is_strict() {
        let cat = |v| normalize(Vitals { sbp: Some(v), ..Default::default() }).get(Feature::Sbp);
        assert_eq!(cat(89.0), Category::Severe);
        assert_eq!(cat(90.0), Category::Ok);
    }

    #[test]
    fn test_rate_and_temp() {
        let facts = normalize(Vitals {
            rr: Some(30.0),
            temp: Some(38.9),
            ..Default::default()
        });
        assert_eq!(facts.get(Feature::Rr), Category::High);
        assert_eq!(facts.get(Feature::Temp), Category::Ok);
    }

    #[test]
    fn test_non_finite_is_unknown() {
        let facts = normalize(Vitals {
            temp: Some(f64::NAN),
            ..Default::default()
        });
        assert_eq!(facts.get(Feature::Temp), Category::Unknown);
    }

    #[test]
    fn test_symptoms_tri_state() {
        let facts = normalize(Vitals {
            dyspnea: Some(true),
            chest_pain: Some(false),
            ..Default::default()
        });
        assert_eq!(facts.get(Feature::Dyspnea), Category::Yes);
        assert_eq!(facts.get(Feature::ChestPain), Category::No);
        assert_eq!(facts.get(Feature::MajorTrauma), Category::Unknown);
    }

    #[test]
    fn test_custom_thresholds() {
        let normalizer = ThresholdNormalizer::new(NormalizerThresholds {
            temp_high_min: 38.0,
            ..Default::default()
        });
        let facts = normalizer.normalize(&Vitals {
            temp: Some(38.2),
            ..Default::default()
        });
        assert_eq!(facts.get(Feature::Temp), Category::High);
    }
}
