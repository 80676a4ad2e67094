//! Scan session reports.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::{ScanId, ScoreResult, SessionAggregate, TemporalSummary, UserContext};

/// Overall structural verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum StructuralStatus {
    Stable,
    #[serde(rename = "Needs Attention")]
    NeedsAttention,
    Concerning,
}

impl StructuralStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StructuralStatus::Stable => "Stable",
            StructuralStatus::NeedsAttention => "Needs Attention",
            StructuralStatus::Concerning => "Concerning",
        }
    }
}

impl fmt::Display for StructuralStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Structural integrity assessment over every detection of a scan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StructuralAssessment {
    pub overall_status: StructuralStatus,
    /// Detection count per class label
    pub defect_summary: BTreeMap<String, usize>,
    pub concerns: Vec<String>,
    pub recommendation: String,
}

/// How soon maintenance should happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
pub enum MaintenanceUrgency {
    #[serde(rename = "Routine maintenance")]
    Routine,
    #[serde(rename = "Within 6 months")]
    WithinSixMonths,
    #[serde(rename = "Within 3 months")]
    WithinThreeMonths,
    Immediate,
}

impl MaintenanceUrgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaintenanceUrgency::Routine => "Routine maintenance",
            MaintenanceUrgency::WithinSixMonths => "Within 6 months",
            MaintenanceUrgency::WithinThreeMonths => "Within 3 months",
            MaintenanceUrgency::Immediate => "Immediate",
        }
    }

    /// Rough repair cost bracket in USD.
    pub fn cost_estimate(&self) -> &'static str {
        match self {
            MaintenanceUrgency::Routine => "$0-200",
            MaintenanceUrgency::WithinSixMonths => "$200-500",
            MaintenanceUrgency::WithinThreeMonths => "$500-2000",
            MaintenanceUrgency::Immediate => "$2000-5000",
        }
    }
}

impl fmt::Display for MaintenanceUrgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Maintenance timeline prediction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MaintenancePrediction {
    pub urgency: MaintenanceUrgency,
    pub estimated_cost: String,
    /// Class labels of the first few detections
    pub priority_items: Vec<String>,
}

/// Everything a finished scan session produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SessionReport {
    pub scan_id: ScanId,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_context: Option<UserContext>,
    pub frame_scores: Vec<ScoreResult>,
    pub aggregate: SessionAggregate,
    /// Present when frames were tracked as a video sequence
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temporal_analysis: Option<TemporalSummary>,
    pub structural_assessment: StructuralAssessment,
    pub maintenance_prediction: MaintenancePrediction,
}
