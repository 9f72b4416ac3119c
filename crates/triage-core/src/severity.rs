//! # Severity Levels — Single Source of Truth
//!
//! Defines `SeverityLevel`, the four-value triage scale. Variants are
//! declared from least to most urgent so the derived `Ord` is the
//! clinical order:
//!
//! ```text
//! White < Green < Yellow < Red
//! ```
//!
//! Every comparison in the stack (queue priority, floor enforcement,
//! hard-override resolution, the decider's guardrail) goes through this
//! derived order. There is no second ranking table to drift out of sync.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::TriageError;

/// Triage severity class, least urgent first.
///
/// | Level | Meaning |
/// |-------|---------|
/// | `White` | Non-urgent, can be deferred |
/// | `Green` | Minor, stable |
/// | `Yellow` | Urgent, potentially unstable |
/// | `Red` | Emergency, immediate threat to life |
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SeverityLevel {
    /// Non-urgent.
    White,
    /// Minor.
    Green,
    /// Urgent.
    Yellow,
    /// Emergency.
    Red,
}

/// Total number of severity levels.
pub const SEVERITY_LEVEL_COUNT: usize = 4;

impl SeverityLevel {
    /// All levels in ascending order of urgency.
    pub const ALL: [SeverityLevel; SEVERITY_LEVEL_COUNT] =
        [Self::White, Self::Green, Self::Yellow, Self::Red];

    /// The most urgent level.
    pub const TOP: SeverityLevel = Self::Red;

    /// The least urgent level.
    pub const BOTTOM: SeverityLevel = Self::White;

    /// Zero-based rank (`White` = 0, `Red` = 3). Usable as an array index.
    pub fn rank(self) -> usize {
        match self {
            Self::White => 0,
            Self::Green => 1,
            Self::Yellow => 2,
            Self::Red => 3,
        }
    }

    /// Inverse of [`rank`](Self::rank).
    pub fn from_rank(rank: usize) -> Option<Self> {
        Self::ALL.get(rank).copied()
    }

    /// Whether this is the most urgent level.
    pub fn is_top(self) -> bool {
        self == Self::TOP
    }

    /// The more severe of two levels.
    pub fn more_severe(self, other: Self) -> Self {
        self.max(other)
    }

    /// Raise `self` to `floor` when a floor is present.
    pub fn at_least(self, floor: Option<Self>) -> Self {
        match floor {
            Some(f) => self.more_severe(f),
            None => self,
        }
    }

    /// Levels from most to least urgent (dispatch order).
    pub fn descending() -> impl Iterator<Item = SeverityLevel> {
        Self::ALL.into_iter().rev()
    }

    /// The snake_case identifier, matching the serde format.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::White => "white",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Red => "red",
        }
    }
}

impl std::fmt::Display for SeverityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SeverityLevel {
    type Err = TriageError;

    /// Parse a level from its identifier. Case-insensitive, surrounding
    /// whitespace ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "white" => Ok(Self::White),
            "green" => Ok(Self::Green),
            "yellow" => Ok(Self::Yellow),
            "red" => Ok(Self::Red),
            _ => Err(TriageError::UnknownSeverity(s.to_string())),
        }
    }
}
