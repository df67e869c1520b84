//! Trend lifecycle classification
//!
//! Two closed enums derived from observed mention volume and elapsed time.
//! Both are persisted as TEXT and must round-trip through their `as_str`
//! representation exactly (the schema enforces the same set via CHECK).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lifecycle bucket derived from 24h mention volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MaturityStage {
    Discovery,
    PolarTrend,
    EarlyMainstream,
    Saturation,
}

impl MaturityStage {
    /// Stable TEXT representation used in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            MaturityStage::Discovery => "DISCOVERY",
            MaturityStage::PolarTrend => "POLAR_TREND",
            MaturityStage::EarlyMainstream => "EARLY_MAINSTREAM",
            MaturityStage::Saturation => "SATURATION",
        }
    }
}

impl fmt::Display for MaturityStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MaturityStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "DISCOVERY" => Ok(MaturityStage::Discovery),
            "POLAR_TREND" => Ok(MaturityStage::PolarTrend),
            "EARLY_MAINSTREAM" => Ok(MaturityStage::EarlyMainstream),
            "SATURATION" => Ok(MaturityStage::Saturation),
            other => Err(format!("unknown maturity stage: {}", other)),
        }
    }
}

/// Prediction confidence label derived from age and mention volume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccuracyStatus {
    TooEarly,
    Rising,
    Exploding,
}

impl AccuracyStatus {
    /// Stable TEXT representation used in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            AccuracyStatus::TooEarly => "TOO_EARLY",
            AccuracyStatus::Rising => "RISING",
            AccuracyStatus::Exploding => "EXPLODING",
        }
    }
}

impl fmt::Display for AccuracyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccuracyStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "TOO_EARLY" => Ok(AccuracyStatus::TooEarly),
            "RISING" => Ok(AccuracyStatus::Rising),
            "EXPLODING" => Ok(AccuracyStatus::Exploding),
            other => Err(format!("unknown accuracy status: {}", other)),
        }
    }
}

/// Calculate maturity stage from 24h mention count
///
/// Boundaries are tested left to right, first match wins:
/// <30 Discovery, <80 PolarTrend, <200 EarlyMainstream, else Saturation.
pub fn maturity_stage(mentions: i64) -> MaturityStage {
    if mentions < 30 {
        MaturityStage::Discovery
    } else if mentions < 80 {
        MaturityStage::PolarTrend
    } else if mentions < 200 {
        MaturityStage::EarlyMainstream
    } else {
        MaturityStage::Saturation
    }
}

/// Calculate accuracy status from days since first detection and mention count
///
/// Under 7 days the trend is always TooEarly regardless of volume.
pub fn accuracy_status(days_since_detected: i64, mentions: i64) -> AccuracyStatus {
    if days_since_detected < 7 {
        AccuracyStatus::TooEarly
    } else if mentions < 100 {
        AccuracyStatus::Rising
    } else {
        AccuracyStatus::Exploding
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_maturity_stage_boundaries() {
        assert_eq!(maturity_stage(0), MaturityStage::Discovery);
        assert_eq!(maturity_stage(29), MaturityStage::Discovery);
        assert_eq!(maturity_stage(30), MaturityStage::PolarTrend);
        assert_eq!(maturity_stage(79), MaturityStage::PolarTrend);
        assert_eq!(maturity_stage(80), MaturityStage::EarlyMainstream);
        assert_eq!(maturity_stage(199), MaturityStage::EarlyMainstream);
        assert_eq!(maturity_stage(200), MaturityStage::Saturation);
        assert_eq!(maturity_stage(100_000), MaturityStage::Saturation);
    }

    #[test]
    fn test_accuracy_days_override_mentions() {
        // High mention volume does not matter before day 7
        assert_eq!(accuracy_status(0, 0), AccuracyStatus::TooEarly);
        assert_eq!(accuracy_status(6, 500), AccuracyStatus::TooEarly);
    }

    #[test]
    fn test_accuracy_after_first_week() {
        assert_eq!(accuracy_status(7, 99), AccuracyStatus::Rising);
        assert_eq!(accuracy_status(10, 50), AccuracyStatus::Rising);
        assert_eq!(accuracy_status(10, 150), AccuracyStatus::Exploding);
        assert_eq!(accuracy_status(7, 100), AccuracyStatus::Exploding);
    }

    #[test]
    fn test_text_round_trip() {
        for stage in [
            MaturityStage::Discovery,
            MaturityStage::PolarTrend,
            MaturityStage::EarlyMainstream,
            MaturityStage::Saturation,
        ] {
            assert_eq!(stage.as_str().parse::<MaturityStage>().unwrap(), stage);
        }
        for status in [
            AccuracyStatus::TooEarly,
            AccuracyStatus::Rising,
            AccuracyStatus::Exploding,
        ] {
            assert_eq!(status.as_str().parse::<AccuracyStatus>().unwrap(), status);
        }
    }

    #[test]
    fn test_unknown_text_rejected() {
        assert!("GROWING".parse::<MaturityStage>().is_err());
        assert!("".parse::<AccuracyStatus>().is_err());
    }
}
