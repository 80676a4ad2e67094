//! Risk score records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Coarse risk band derived from a 0–100 score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum RiskLevel {
    #[serde(rename = "Low Risk")]
    Low,
    #[serde(rename = "Moderate Risk")]
    Moderate,
    #[serde(rename = "High Risk")]
    High,
}

impl RiskLevel {
    /// Upper bound (inclusive) of the high-risk band.
    pub const HIGH_RISK_MAX: u8 = 30;
    /// Upper bound (inclusive) of the moderate-risk band.
    pub const MODERATE_RISK_MAX: u8 = 60;

    /// Band for a score: ≤30 high, ≤60 moderate, otherwise low.
    pub fn from_score(score: u8) -> Self {
        if score <= Self::HIGH_RISK_MAX {
            RiskLevel::High
        } else if score <= Self::MODERATE_RISK_MAX {
            RiskLevel::Moderate
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low Risk",
            RiskLevel::Moderate => "Moderate Risk",
            RiskLevel::High => "High Risk",
        }
    }

    /// Fixed summary sentence for the band.
    pub fn summary(&self) -> &'static str {
        match self {
            RiskLevel::High => {
                "Critical defects detected. Immediate professional inspection recommended."
            }
            RiskLevel::Moderate => {
                "Several defects detected. Consider addressing these issues soon."
            }
            RiskLevel::Low => "Minor issues detected. Property is in acceptable condition.",
        }
    }

    /// Recommended actions for the band, most urgent first.
    pub fn recommended_actions(&self) -> &'static [&'static str] {
        match self {
            RiskLevel::High => &[
                "Schedule professional inspection immediately",
                "Document all affected areas with photos",
                "Consider temporary mitigation measures",
            ],
            RiskLevel::Moderate => &[
                "Schedule professional assessment within 2 weeks",
                "Monitor affected areas for changes",
                "Obtain repair estimates",
            ],
            RiskLevel::Low => &[
                "Include in regular maintenance schedule",
                "Monitor for deterioration over time",
            ],
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Penalty contributed by one detection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DefectPenalty {
    /// Normalized class key used for the weight lookup
    pub defect_type: String,
    /// Detection confidence, rounded to 2 decimals
    pub confidence: f64,
    /// Penalty points, rounded to 2 decimals
    pub penalty: f64,
    /// Weight-table severity (1–5)
    pub severity: f64,
    /// Why this class matters
    pub description: String,
    /// Whether a climate multiplier other than 1.0 was applied
    pub climate_adjusted: bool,
}

/// Component totals behind a score.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct PenaltyBreakdown {
    /// Defect penalty after the cap
    pub defects: f64,
    /// Building-age penalty (uncapped)
    pub age_factor: f64,
    /// Uncapped penalty per class key
    pub by_defect_type: BTreeMap<String, f64>,
}

/// Output of one scoring call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ScoreResult {
    /// Safety score in [0, 100], higher is safer
    pub score: u8,
    pub risk_level: RiskLevel,
    pub defect_count: usize,
    /// Capped defect penalty plus age penalty, rounded to 2 decimals
    pub total_penalty: f64,
    pub penalty_breakdown: PenaltyBreakdown,
    /// Per-detection contributions, in input order
    pub breakdown: Vec<DefectPenalty>,
    pub summary: String,
    pub recommended_actions: Vec<String>,
    pub user_context_applied: bool,
}

impl ScoreResult {
    /// The perfect result returned when nothing was detected.
    pub fn perfect() -> Self {
        Self {
            score: 100,
            risk_level: RiskLevel::Low,
            defect_count: 0,
            total_penalty: 0.0,
            penalty_breakdown: PenaltyBreakdown::default(),
            breakdown: Vec::new(),
            summary: "No defects detected. Property appears to be in good condition.".to_string(),
            recommended_actions: vec!["Continue regular maintenance".to_string()],
            user_context_applied: false,
        }
    }
}

/// Combination of many per-frame results from one session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SessionAggregate {
    /// Worst (minimum) frame score
    pub score: u8,
    /// Rounded mean frame score, informational only
    pub average_score: u8,
    /// Band of the worst frame score
    pub risk_level: RiskLevel,
    pub frames_analyzed: usize,
    pub total_defects_found: usize,
    /// Concatenated per-frame breakdowns, not deduplicated
    pub defect_breakdown: Vec<DefectPenalty>,
}
