//! Configuration for the inspection pipeline.

use safenest_models::Sensitivity;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{VisionError, VisionResult};

/// Threshold bundle selected by a sensitivity level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DetectionThresholds {
    /// Canny lower hysteresis bound
    pub edge_low: f32,
    /// Canny upper hysteresis bound
    pub edge_high: f32,
    /// Minimum contour area in pixels (color defects use twice this)
    pub min_area: f64,
}

impl DetectionThresholds {
    /// Thresholds for a sensitivity level.
    pub fn for_sensitivity(sensitivity: Sensitivity) -> Self {
        match sensitivity {
            Sensitivity::Low => Self {
                edge_low: 100.0,
                edge_high: 200.0,
                min_area: 500.0,
            },
            Sensitivity::Medium => Self {
                edge_low: 50.0,
                edge_high: 150.0,
                min_area: 200.0,
            },
            Sensitivity::High => Self {
                edge_low: 30.0,
                edge_high: 100.0,
                min_area: 100.0,
            },
        }
    }
}

impl Default for DetectionThresholds {
    fn default() -> Self {
        Self::for_sensitivity(Sensitivity::Medium)
    }
}

/// Configuration for the classical defect detector.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Sensitivity level (default: medium)
    pub sensitivity: Sensitivity,

    /// Gaussian blur sigma before contrast enhancement (default: 1.1, a 5×5 kernel)
    pub blur_sigma: f32,

    /// CLAHE clip limit (default: 2.0)
    pub clahe_clip_limit: f64,

    /// CLAHE tile grid size per axis (default: 8)
    pub clahe_grid: u32,

    /// Minimum `max(w,h)/(min(w,h)+1)` for a crack contour (default: 2.0)
    pub crack_min_aspect_ratio: f64,

    /// Maximum area/perimeter ratio for a crack contour (default: 15.0)
    pub crack_max_area_perimeter_ratio: f64,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            sensitivity: Sensitivity::Medium,
            blur_sigma: 1.1,
            clahe_clip_limit: 2.0,
            clahe_grid: 8,
            crack_min_aspect_ratio: 2.0,
            crack_max_area_perimeter_ratio: 15.0,
        }
    }
}

impl DetectorConfig {
    /// Default configuration at a given sensitivity.
    pub fn with_sensitivity(sensitivity: Sensitivity) -> Self {
        Self {
            sensitivity,
            ..Default::default()
        }
    }

    /// Threshold bundle for the configured sensitivity.
    pub fn thresholds(&self) -> DetectionThresholds {
        DetectionThresholds::for_sensitivity(self.sensitivity)
    }

    /// Check preprocessing parameters.
    pub fn validate(&self) -> VisionResult<()> {
        if !(self.blur_sigma > 0.0) || !self.blur_sigma.is_finite() {
            return Err(VisionError::config(format!(
                "blur_sigma must be positive, got {}",
                self.blur_sigma
            )));
        }
        if self.clahe_grid < 1 {
            return Err(VisionError::config("clahe_grid must be at least 1"));
        }
        if !(self.clahe_clip_limit >= 0.0) {
            return Err(VisionError::config(format!(
                "clahe_clip_limit must be non-negative, got {}",
                self.clahe_clip_limit
            )));
        }
        Ok(())
    }
}

/// Configuration for the temporal defect tracker.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackerConfig {
    /// IoU threshold for track matching (default: 0.3)
    pub iou_threshold: f64,

    /// Frames a track may go unmatched and stay eligible (default: 5)
    pub max_dropout: u64,

    /// Matches required before a track counts as persistent (default: 3)
    pub persistence_frames: u32,

    /// Growth rate above which a track counts as growing (default: 0.05)
    pub growth_threshold: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.3,
            max_dropout: 5,
            persistence_frames: 3,
            growth_threshold: 0.05,
        }
    }
}

/// Configuration for the risk scorer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScorerConfig {
    /// Starting score before penalties (default: 100.0)
    pub base_score: f64,

    /// Cap on the summed defect penalty, excluding age (default: 70.0)
    pub max_defects_penalty: f64,

    /// How strongly confidence scales a penalty (default: 0.8)
    pub confidence_weight: f64,

    /// Resolve labels like "Water Damage" and "Rust/Corrosion" to their
    /// table entries instead of only lower-casing them (default: false)
    #[serde(default)]
    pub canonical_class_names: bool,
}

impl Default for ScorerConfig {
    fn default() -> Self {
        Self {
            base_score: 100.0,
            max_defects_penalty: 70.0,
            confidence_weight: 0.8,
            canonical_class_names: false,
        }
    }
}

/// Configuration for a whole inspection run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InspectionConfig {
    pub detector: DetectorConfig,
    pub tracker: TrackerConfig,
    pub scorer: ScorerConfig,

    /// Frames per second to sample from a video sequence (default: 5.0)
    pub target_fps: f64,

    /// IoU at or above which a secondary detection duplicates a kept one
    /// when merging detector outputs (default: 1.0, identical boxes only)
    pub dedup_iou: f64,
}

impl Default for InspectionConfig {
    fn default() -> Self {
        Self {
            detector: DetectorConfig::default(),
            tracker: TrackerConfig::default(),
            scorer: ScorerConfig::default(),
            target_fps: 5.0,
            dedup_iou: 1.0,
        }
    }
}

impl InspectionConfig {
    /// Create config from environment variables.
    ///
    /// Unset or unparsable variables keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let sensitivity = match std::env::var("SAFENEST_SENSITIVITY") {
            Ok(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{}, using medium sensitivity", e);
                Sensitivity::Medium
            }),
            Err(_) => defaults.detector.sensitivity,
        };

        Self {
            detector: DetectorConfig {
                sensitivity,
                ..defaults.detector
            },
            tracker: TrackerConfig {
                iou_threshold: env_parse("SAFENEST_IOU_THRESHOLD")
                    .unwrap_or(defaults.tracker.iou_threshold),
                max_dropout: env_parse("SAFENEST_MAX_DROPOUT")
                    .unwrap_or(defaults.tracker.max_dropout),
                ..defaults.tracker
            },
            scorer: ScorerConfig {
                confidence_weight: env_parse("SAFENEST_CONFIDENCE_WEIGHT")
                    .unwrap_or(defaults.scorer.confidence_weight),
                max_defects_penalty: env_parse("SAFENEST_MAX_DEFECTS_PENALTY")
                    .unwrap_or(defaults.scorer.max_defects_penalty),
                canonical_class_names: env_parse("SAFENEST_CANONICAL_CLASS_NAMES")
                    .unwrap_or(defaults.scorer.canonical_class_names),
                ..defaults.scorer
            },
            target_fps: env_parse("SAFENEST_TARGET_FPS").unwrap_or(defaults.target_fps),
            dedup_iou: env_parse("SAFENEST_DEDUP_IOU").unwrap_or(defaults.dedup_iou),
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> VisionResult<()> {
        self.detector.validate()?;
        if !(0.0..=1.0).contains(&self.tracker.iou_threshold) {
            return Err(VisionError::config(format!(
                "iou_threshold must be in [0, 1], got {}",
                self.tracker.iou_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.scorer.confidence_weight) {
            return Err(VisionError::config(format!(
                "confidence_weight must be in [0, 1], got {}",
                self.scorer.confidence_weight
            )));
        }
        if !(self.scorer.max_defects_penalty >= 0.0) {
            return Err(VisionError::config(format!(
                "max_defects_penalty must be non-negative, got {}",
                self.scorer.max_defects_penalty
            )));
        }
        if !(self.target_fps > 0.0) {
            return Err(VisionError::config(format!(
                "target_fps must be positive, got {}",
                self.target_fps
            )));
        }
        if !(0.0..=1.0).contains(&self.dedup_iou) {
            return Err(VisionError::config(format!(
                "dedup_iou must be in [0, 1], got {}",
                self.dedup_iou
            )));
        }
        Ok(())
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}
