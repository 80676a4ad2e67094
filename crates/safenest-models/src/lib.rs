//! Shared data models for the SafeNest inspection core.
//!
//! This crate provides Serde-serializable types for:
//! - Defect detections and their bounding boxes
//! - Risk scores, penalty breakdowns and session aggregates
//! - Temporal tracking summaries
//! - Inspection context (building age, climate) and detector sensitivity
//! - Scan session reports

pub mod bbox;
pub mod context;
pub mod detection;
pub mod report;
pub mod scan;
pub mod score;
pub mod sensitivity;
pub mod track;

// Re-export common types
pub use bbox::BoundingBox;
pub use context::{BuildingAge, Climate, UserContext};
pub use detection::{Detection, DetectionMethod, Severity};
pub use report::{
    MaintenancePrediction, MaintenanceUrgency, SessionReport, StructuralAssessment,
    StructuralStatus,
};
pub use scan::ScanId;
pub use score::{DefectPenalty, PenaltyBreakdown, RiskLevel, ScoreResult, SessionAggregate};
pub use sensitivity::{Sensitivity, SensitivityParseError};
pub use track::{TemporalSummary, TrackSummary};
