//! Detector sensitivity levels.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Detection sensitivity for the classical detector.
///
/// Higher sensitivity lowers the Canny thresholds and the minimum contour
/// area, trading precision for recall.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum Sensitivity {
    Low,
    #[default]
    Medium,
    High,
}

impl Sensitivity {
    /// All available sensitivity levels.
    pub const ALL: &'static [Sensitivity] =
        &[Sensitivity::Low, Sensitivity::Medium, Sensitivity::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sensitivity::Low => "low",
            Sensitivity::Medium => "medium",
            Sensitivity::High => "high",
        }
    }
}

impl fmt::Display for Sensitivity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Sensitivity {
    type Err = SensitivityParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Sensitivity::Low),
            "medium" | "default" => Ok(Sensitivity::Medium),
            "high" => Ok(Sensitivity::High),
            _ => Err(SensitivityParseError(s.to_string())),
        }
    }
}

#[derive(Debug, Error)]
#[error("Unknown sensitivity: {0}")]
pub struct SensitivityParseError(String);
