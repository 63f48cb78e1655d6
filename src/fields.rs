//! Enumerations shared by goals, settings and progress display.
//!
//! This module defines the duration units used to seed a goal's end date, the
//! notification tones a user can pick, and the five status bands derived from
//! progress percentages.

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

/// Unit of the duration a goal is created with.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    #[default]
    #[serde(alias = "day")]
    Days,
    #[serde(alias = "week")]
    Weeks,
    #[serde(alias = "month")]
    Months,
    #[serde(alias = "year")]
    Years,
}

impl DurationUnit {
    /// Singular or plural label for `value` units.
    pub fn label(self, value: u32) -> &'static str {
        match (self, value == 1) {
            (DurationUnit::Days, true) => "day",
            (DurationUnit::Days, false) => "days",
            (DurationUnit::Weeks, true) => "week",
            (DurationUnit::Weeks, false) => "weeks",
            (DurationUnit::Months, true) => "month",
            (DurationUnit::Months, false) => "months",
            (DurationUnit::Years, true) => "year",
            (DurationUnit::Years, false) => "years",
        }
    }
}

/// Notification tone identifier. The tool only records the choice; playing it
/// is up to whatever front end reads the settings.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, ValueEnum, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Bell,
    Cheer,
    Success,
    Coin,
    Whoosh,
}

impl Tone {
    pub fn name(self) -> &'static str {
        match self {
            Tone::Bell => "bell",
            Tone::Cheer => "cheer",
            Tone::Success => "success",
            Tone::Coin => "coin",
            Tone::Whoosh => "whoosh",
        }
    }
}

/// Discrete status level derived from a progress percentage.
///
/// Exactly five bands: `{0}`, `(0, 25)`, `[25, 50)`, `[50, 75)`, `[75, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatusBand {
    Idle,
    Low,
    Mid,
    High,
    Top,
}

impl StatusBand {
    /// Colour token for the band, as stored by front ends.
    pub fn token(self) -> &'static str {
        match self {
            StatusBand::Idle => "#ff0844",
            StatusBand::Low => "#ff6b35",
            StatusBand::Mid => "#ffd700",
            StatusBand::High => "#a8e063",
            StatusBand::Top => "#56f000",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StatusBand::Idle => "idle",
            StatusBand::Low => "low",
            StatusBand::Mid => "mid",
            StatusBand::High => "high",
            StatusBand::Top => "top",
        }
    }
}
