//! # Features, Categories, and Fact Sets
//!
//! A fact set maps each clinical [`Feature`] to one [`Category`] from that
//! feature's closed list. Discretization has already happened upstream
//! (see [`crate::normalize`]); this module only deals in categories.
//!
//! ## Closed Category Lists
//!
//! | Feature | Categories |
//! |---------|------------|
//! | `spo2` | severe, moderate, ok, unknown |
//! | `sbp` | severe, ok, unknown |
//! | `rr` | high, ok, unknown |
//! | `temp` | high, ok, unknown |
//! | `chest_pain`, `dyspnea`, `altered_consciousness`, `major_trauma`, `massive_bleeding` | yes, no, unknown |
//!
//! ## Invariants
//!
//! - `FactSet::get` never fails: an absent feature reads as `unknown`.
//! - A fact set never stores a category outside its feature's list; such
//!   assignments are coerced to `unknown`.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize, Serializer};

use crate::error::TriageError;

// ─── Feature ─────────────────────────────────────────────────────────

/// Observed clinical features.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    /// Peripheral oxygen saturation.
    Spo2,
    /// Systolic blood pressure.
    Sbp,
    /// Respiratory rate.
    Rr,
    /// Body temperature.
    Temp,
    /// Chest pain reported.
    ChestPain,
    /// Shortness of breath.
    Dyspnea,
    /// Altered level of consciousness.
    AlteredConsciousness,
    /// Major trauma mechanism.
    MajorTrauma,
    /// Massive external bleeding.
    MassiveBleeding,
}

/// Number of observed features.
pub const FEATURE_COUNT: usize = 9;

const SPO2_CATEGORIES: &[Category] = &[
    Category::Severe,
    Category::Moderate,
    Category::Ok,
    Category::Unknown,
];
const SBP_CATEGORIES: &[Category] = &[Category::Severe, Category::Ok, Category::Unknown];
const RATE_CATEGORIES: &[Category] = &[Category::High, Category::Ok, Category::Unknown];
const SYMPTOM_CATEGORIES: &[Category] = &[Category::Yes, Category::No, Category::Unknown];

impl Feature {
    /// All features in canonical order.
    pub const ALL: [Feature; FEATURE_COUNT] = [
        Self::Spo2,
        Self::Sbp,
        Self::Rr,
        Self::Temp,
        Self::ChestPain,
        Self::Dyspnea,
        Self::AlteredConsciousness,
        Self::MajorTrauma,
        Self::MassiveBleeding,
    ];

    /// The closed category list for this feature. Always contains
    /// [`Category::Unknown`].
    pub fn categories(self) -> &'static [Category] {
        match self {
            Self::Spo2 => SPO2_CATEGORIES,
            Self::Sbp => SBP_CATEGORIES,
            Self::Rr | Self::Temp => RATE_CATEGORIES,
            Self::ChestPain
            | Self::Dyspnea
            | Self::AlteredConsciousness
            | Self::MajorTrauma
            | Self::MassiveBleeding => SYMPTOM_CATEGORIES,
        }
    }

    /// Whether `category` belongs to this feature's list.
    pub fn accepts(self, category: Category) -> bool {
        self.categories().contains(&category)
    }

    /// The snake_case identifier, matching the serde format.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Spo2 => "spo2",
            Self::Sbp => "sbp",
            Self::Rr => "rr",
            Self::Temp => "temp",
            Self::ChestPain => "chest_pain",
            Self::Dyspnea => "dyspnea",
            Self::AlteredConsciousness => "altered_consciousness",
            Self::MajorTrauma => "major_trauma",
            Self::MassiveBleeding => "massive_bleeding",
        }
    }
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Feature {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == s.trim())
            .ok_or_else(|| TriageError::UnknownFeature(s.to_string()))
    }
}

// ─── Category ────────────────────────────────────────────────────────

/// Discretized value of a feature.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Severely abnormal.
    Severe,
    /// Moderately abnormal.
    Moderate,
    /// Above the alarm threshold.
    High,
    /// Within normal range.
    Ok,
    /// Symptom present.
    Yes,
    /// Symptom absent.
    No,
    /// Not observed or not recognized.
    Unknown,
}

impl Category {
    /// Every category.
    pub const ALL: [Category; 7] = [
        Self::Severe,
        Self::Moderate,
        Self::High,
        Self::Ok,
        Self::Yes,
        Self::No,
        Self::Unknown,
    ];

    /// The snake_case identifier, matching the serde format.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Severe => "severe",
            Self::Moderate => "moderate",
            Self::High => "high",
            Self::Ok => "ok",
            Self::Yes => "yes",
            Self::No => "no",
            Self::Unknown => "unknown",
        }
    }

    /// Whether this is the `unknown` sentinel.
    pub fn is_unknown(self) -> bool {
        self == Self::Unknown
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = TriageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s.trim())
            .ok_or_else(|| TriageError::UnknownCategory(s.to_string()))
    }
}

// ─── FactSet ─────────────────────────────────────────────────────────

/// Feature → category mapping for one case.
///
/// Serializes as a flat map (`{"spo2": "severe", ...}`). Deserialization
/// is lenient: unrecognized feature names are dropped and unrecognized or
/// out-of-list categories become `unknown`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(from = "BTreeMap<String, String>")]
pub struct FactSet {
    values: BTreeMap<Feature, Category>,
}

impl FactSet {
    /// An empty fact set (every feature reads as `unknown`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`set`](Self::set).
    pub fn with(mut self, feature: Feature, category: Category) -> Self {
        self.set(feature, category);
        self
    }

    /// Record `category` for `feature`.
    ///
    /// A category outside the feature's list is stored as `unknown`.
    pub fn set(&mut self, feature: Feature, category: Category) {
        let stored = if feature.accepts(category) {
            category
        } else {
            tracing::debug!(
                feature = %feature,
                category = %category,
                "category outside feature list, recording unknown"
            );
            Category::Unknown
        };
        // Absent and unknown read the same; keep one representation.
        if stored.is_unknown() {
            self.values.remove(&feature);
        } else {
            self.values.insert(feature, stored);
        }
    }

    /// Category for `feature`, `unknown` when absent.
    pub fn get(&self, feature: Feature) -> Category {
        self.values
            .get(&feature)
            .copied()
            .unwrap_or(Category::Unknown)
    }

    /// Whether `feature` currently reads as `category`.
    pub fn holds(&self, feature: Feature, category: Category) -> bool {
        self.get(feature) == category
    }

    /// Strict single assignment. Rejects unknown names and categories
    /// outside the feature's list.
    pub fn try_set(&mut self, feature: &str, category: &str) -> Result<(), TriageError> {
        let feature: Feature = feature.parse()?;
        let category: Category = category.parse()?;
        if !feature.accepts(category) {
            return Err(TriageError::CategoryOutsideFeature {
                feature: feature.to_string(),
                category: category.to_string(),
            });
        }
        self.set(feature, category);
        Ok(())
    }

    /// Strict parse of a `feature=category` assignment.
    pub fn apply_assignment(&mut self, assignment: &str) -> Result<(), TriageError> {
        let (feature, category) = assignment
            .split_once('=')
            .ok_or_else(|| TriageError::MalformedAssignment(assignment.to_string()))?;
        self.try_set(feature, category)
    }

    /// Lenient construction from raw name/value pairs.
    ///
    /// Unknown feature names are ignored; unknown or out-of-list
    /// categories are recorded as `unknown`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut facts = Self::new();
        for (k, v) in pairs {
            let (k, v) = (k.as_ref(), v.as_ref());
            let Ok(feature) = k.parse::<Feature>() else {
                tracing::debug!(feature = k, "ignoring unrecognized feature");
                continue;
            };
            let category = v.parse::<Category>().unwrap_or_else(|_| {
                tracing::debug!(feature = k, value = v, "unrecognized category, recording unknown");
                Category::Unknown
            });
            facts.set(feature, category);
        }
        facts
    }

    /// Every feature with its current category, in canonical order.
    /// Absent features appear as `unknown`.
    pub fn iter(&self) -> impl Iterator<Item = (Feature, Category)> + '_ {
        Feature::ALL.into_iter().map(move |f| (f, self.get(f)))
    }

    /// Number of features with a known (non-`unknown`) category.
    pub fn known_count(&self) -> usize {
        self.iter().filter(|(_, c)| !c.is_unknown()).count()
    }
}

impl From<BTreeMap<String, String>> for FactSet {
    fn from(raw: BTreeMap<String, String>) -> Self {
        Self::from_pairs(raw)
    }
}

impl Serialize for FactSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}

impl std::fmt::Display for FactSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (feature, category) in self.iter() {
            if category.is_unknown() {
                continue;
            }
            if !first {
                f.write_str(", ")?;
            }
            write!(f, "{feature}={category}")?;
            first = false;
        }
        if first {
            f.write_str("(no known facts)")?;
        }
        Ok(())
    }
}
