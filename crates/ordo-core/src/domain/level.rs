//! Enumerated levels for importance and effort.
//!
//! Both are closed sets with a numeric weight (used by the score) and a
//! display name looked up from a static table. The tables are read-only.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::errors::OrdoError;

/// Display names indexed by importance weight.
pub const IMPORTANCE_NAMES: [&str; 5] = ["None", "Low", "Medium", "High", "Critical"];

/// Display names indexed by effort weight.
pub const EFFORT_NAMES: [&str; 5] = ["Minutes", "An hour", "Half a day", "A day", "Several days"];

/// How much a task matters. Multiplies urgency in the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Importance {
    None = 0,
    Low = 1,
    Medium = 2,
    High = 3,
    Critical = 4,
}

/// Estimated effort (not wall-clock minutes). Subtracted from the score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Minutes = 0,
    Hour = 1,
    HalfDay = 2,
    Day = 3,
    Days = 4,
}

impl Importance {
    pub const ALL: [Importance; 5] = [
        Importance::None,
        Importance::Low,
        Importance::Medium,
        Importance::High,
        Importance::Critical,
    ];

    pub fn weight(self) -> i64 {
        self as i64
    }

    pub fn display_name(self) -> &'static str {
        IMPORTANCE_NAMES[self as usize]
    }

    pub fn from_weight(weight: u8) -> Result<Self, OrdoError> {
        Self::ALL
            .get(weight as usize)
            .copied()
            .ok_or_else(|| OrdoError::Validation(format!("importance level {weight} out of range")))
    }
}

impl Effort {
    pub const ALL: [Effort; 5] = [
        Effort::Minutes,
        Effort::Hour,
        Effort::HalfDay,
        Effort::Day,
        Effort::Days,
    ];

    pub fn weight(self) -> i64 {
        self as i64
    }

    pub fn display_name(self) -> &'static str {
        EFFORT_NAMES[self as usize]
    }

    pub fn from_weight(weight: u8) -> Result<Self, OrdoError> {
        Self::ALL
            .get(weight as usize)
            .copied()
            .ok_or_else(|| OrdoError::Validation(format!("effort level {weight} out of range")))
    }
}

impl fmt::Display for Importance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
