//! Classical computer-vision defect detector.
//!
//! Runs independent sub-detectors over one image and concatenates their
//! output:
//!
//! ```text
//! RGB image ──► grayscale ──► blur ─► CLAHE ─► Canny ─► dilate ─► contours ─► cracks
//!     │
//!     └──────► HSV ──► range mask ─► open/close ─► contours ─► rust / mold / water
//! ```
//!
//! The detector holds only configuration, so one instance can be shared
//! across threads and sessions.

pub mod color;
pub mod crack;
pub mod preprocess;

use std::path::Path;

use image::RgbImage;
use safenest_models::{Detection, Sensitivity};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::DetectorConfig;
use crate::error::{VisionError, VisionResult};
use crate::numeric::round2;

pub use color::{ColorRange, COLOR_RANGES};
pub use crack::CRACK_CLASS;

/// Which defect families to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetectionFlags {
    pub detect_cracks: bool,
    pub detect_water_damage: bool,
    pub detect_mold: bool,
    pub detect_rust: bool,
}

impl Default for DetectionFlags {
    fn default() -> Self {
        Self::all()
    }
}

impl DetectionFlags {
    /// Every sub-detector enabled.
    pub fn all() -> Self {
        Self {
            detect_cracks: true,
            detect_water_damage: true,
            detect_mold: true,
            detect_rust: true,
        }
    }

    /// Only the crack detector enabled.
    pub fn cracks_only() -> Self {
        Self {
            detect_cracks: true,
            detect_water_damage: false,
            detect_mold: false,
            detect_rust: false,
        }
    }

    /// Only the color detectors enabled.
    pub fn colors_only() -> Self {
        Self {
            detect_cracks: false,
            ..Self::all()
        }
    }
}

/// Result of analyzing one image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    /// Cracks first, then rust, mold and water damage
    pub defects: Vec<Detection>,
    /// Sum of per-defect affected percentages, rounded to 2 decimals
    pub total_affected_percent: f64,
    pub defect_count: usize,
}

/// Classical CV defect detector.
#[derive(Debug, Clone, Default)]
pub struct DefectDetector {
    config: DetectorConfig,
}

impl DefectDetector {
    /// Create a detector from config.
    pub fn new(config: DetectorConfig) -> Self {
        info!(sensitivity = %config.sensitivity, "Defect detector initialized");
        Self { config }
    }

    /// Create a detector with default settings at a sensitivity level.
    pub fn with_sensitivity(sensitivity: Sensitivity) -> Self {
        Self::new(DetectorConfig::with_sensitivity(sensitivity))
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Analyze an image for structural defects.
    ///
    /// Fails for an image without pixels or an invalid config; an image with
    /// no matching regions yields an empty defect list.
    pub fn analyze(&self, image: &RgbImage, flags: DetectionFlags) -> VisionResult<AnalysisResult> {
        self.config.validate()?;

        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(VisionError::invalid_image("image has no pixels"));
        }

        let total_pixels = width as f64 * height as f64;
        let min_area = self.config.thresholds().min_area;
        let mut defects = Vec::new();

        if flags.detect_cracks {
            let gray = preprocess::to_gray(image);
            defects.extend(crack::detect_cracks(&gray, &self.config, total_pixels));
        }

        if flags.detect_rust || flags.detect_mold || flags.detect_water_damage {
            let hsv = preprocess::to_hsv(image);
            let color_min_area = min_area * 2.0;

            let mut ranges: Vec<&ColorRange> = Vec::new();
            if flags.detect_rust {
                ranges.push(&color::RUST);
            }
            if flags.detect_mold {
                ranges.extend([&color::MOLD_GREEN, &color::MOLD_BLACK]);
            }
            if flags.detect_water_damage {
                ranges.extend([&color::WATER_STAIN, &color::WATER_DAMAGE_BROWN]);
            }

            for range in ranges {
                let found = color::detect_color_defect(&hsv, range, color_min_area, total_pixels);
                debug!(range = range.key, count = found.len(), "Color range analyzed");
                defects.extend(found);
            }
        }

        for det in &defects {
            metrics::counter!("safenest_detections_total", "method" => det.detection_method.as_str())
                .increment(1);
        }

        let total_affected: f64 = defects
            .iter()
            .filter_map(|d| d.affected_area_percent)
            .sum();
        let total_affected_percent = round2(total_affected);

        info!(
            width,
            height,
            defect_count = defects.len(),
            total_affected_percent,
            "Image analyzed"
        );

        Ok(AnalysisResult {
            defect_count: defects.len(),
            defects,
            total_affected_percent,
        })
    }

    /// Analyze a packed RGB buffer (`width * height * 3` bytes).
    pub fn analyze_raw(
        &self,
        pixels: &[u8],
        width: u32,
        height: u32,
        flags: DetectionFlags,
    ) -> VisionResult<AnalysisResult> {
        let image = raw_to_image(pixels, width, height)?;
        self.analyze(&image, flags)
    }
}

/// Wrap a packed RGB buffer as an image, checking its length.
pub fn raw_to_image(pixels: &[u8], width: u32, height: u32) -> VisionResult<RgbImage> {
    let expected = width as usize * height as usize * 3;
    if expected == 0 || pixels.len() != expected {
        return Err(VisionError::invalid_image(format!(
            "expected {} bytes for {}x{} RGB, got {}",
            expected,
            width,
            height,
            pixels.len()
        )));
    }
    RgbImage::from_raw(width, height, pixels.to_vec())
        .ok_or_else(|| VisionError::invalid_image("buffer does not match dimensions"))
}

/// Decode an encoded image (PNG, JPEG) from memory.
pub fn decode_image(bytes: &[u8]) -> VisionResult<RgbImage> {
    if bytes.is_empty() {
        return Err(VisionError::invalid_image("empty image buffer"));
    }
    let decoded = image::load_from_memory(bytes)
        .map_err(|e| VisionError::invalid_image(format!("cannot decode image: {}", e)))?;
    let rgb = decoded.to_rgb8();
    if rgb.width() == 0 || rgb.height() == 0 {
        return Err(VisionError::invalid_image("image has no pixels"));
    }
    Ok(rgb)
}

/// Load and decode an image file.
pub fn load_image(path: impl AsRef<Path>) -> VisionResult<RgbImage> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(VisionError::FileNotFound(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    decode_image(&bytes)
}
