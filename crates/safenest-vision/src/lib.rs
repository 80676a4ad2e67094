//! Property defect inspection core.
//!
//! This crate provides:
//! - A classical computer-vision defect detector (cracks, rust, mold, water damage)
//! - A temporal tracker following defects across video frames
//! - An explainable 0–100 risk scorer with climate and building-age context
//! - Scan sessions tying the three together into a single report
//!
//! The detector and scorer hold only configuration and are safe to share
//! across threads; each session owns its own tracker.

pub mod annotate;
pub mod assessment;
pub mod config;
pub mod detector;
pub mod error;
pub mod merge;
pub mod numeric;
pub mod scorer;
pub mod session;
pub mod tracker;

pub use annotate::{draw_detections, save_annotated};
pub use assessment::{maintenance_prediction, structural_assessment};
pub use config::{DetectionThresholds, DetectorConfig, InspectionConfig, ScorerConfig, TrackerConfig};
pub use detector::{decode_image, load_image, AnalysisResult, DefectDetector, DetectionFlags};
pub use error::{VisionError, VisionResult};
pub use merge::merge_detections;
pub use scorer::RiskScorer;
pub use session::{sample_interval, FrameReport, ScanSession};
pub use tracker::{DefectTracker, Track};
