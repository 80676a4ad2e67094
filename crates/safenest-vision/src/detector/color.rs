//! Color-range defect detection (rust, mold, water damage).

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, open};
use safenest_models::{Detection, DetectionMethod, Severity};

use super::crack::shape_bbox;
use super::preprocess::{external_contours, in_range, HsvImage};
use crate::numeric::round2;

/// One named HSV range in the color table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorRange {
    /// Table key, e.g. `mold_green`
    pub key: &'static str,
    /// Inclusive lower bound (H, S, V)
    pub lower: [u8; 3],
    /// Inclusive upper bound (H, S, V)
    pub upper: [u8; 3],
    /// Human-readable range name
    pub name: &'static str,
}

impl ColorRange {
    /// Canonical class label emitted for detections in this range.
    pub fn class_name(&self) -> &'static str {
        if self.key.contains("mold") {
            "Mold"
        } else if self.key.contains("water") {
            "Water Damage"
        } else if self.key.contains("rust") {
            "Rust/Corrosion"
        } else {
            self.name
        }
    }
}

pub const RUST: ColorRange = ColorRange {
    key: "rust",
    lower: [5, 100, 100],
    upper: [25, 255, 255],
    name: "Rust/Corrosion",
};

pub const MOLD_GREEN: ColorRange = ColorRange {
    key: "mold_green",
    lower: [35, 40, 40],
    upper: [85, 255, 200],
    name: "Mold (Green)",
};

pub const MOLD_BLACK: ColorRange = ColorRange {
    key: "mold_black",
    lower: [0, 0, 0],
    upper: [180, 50, 50],
    name: "Mold (Black)",
};

pub const WATER_STAIN: ColorRange = ColorRange {
    key: "water_stain",
    lower: [90, 30, 100],
    upper: [130, 150, 200],
    name: "Water Stain",
};

pub const WATER_DAMAGE_BROWN: ColorRange = ColorRange {
    key: "water_damage_brown",
    lower: [10, 50, 50],
    upper: [30, 200, 180],
    name: "Water Damage",
};

/// The full color table.
pub const COLOR_RANGES: &[ColorRange] = &[RUST, MOLD_GREEN, MOLD_BLACK, WATER_STAIN, WATER_DAMAGE_BROWN];

/// Look up a range by table key.
pub fn color_range(key: &str) -> Option<&'static ColorRange> {
    COLOR_RANGES.iter().find(|r| r.key == key)
}

/// Detect regions of `hsv` falling in `range`.
///
/// Regions smaller than `min_area` pixels are dropped; callers pass twice
/// the sensitivity floor.
pub fn detect_color_defect(
    hsv: &HsvImage,
    range: &ColorRange,
    min_area: f64,
    total_pixels: f64,
) -> Vec<Detection> {
    let mask = clean_mask(&in_range(hsv, range.lower, range.upper));

    external_contours(&mask)
        .into_iter()
        .filter(|shape| shape.area >= min_area)
        .map(|shape| {
            let affected = 100.0 * shape.area / total_pixels;
            let (severity, confidence) = color_tier(affected);
            Detection::new(shape_bbox(&shape), range.class_name(), confidence)
                .with_severity(severity)
                .with_affected_area(round2(affected))
                .with_method(DetectionMethod::CvColor)
        })
        .collect()
}

/// Remove speckle then fill small gaps with a 5×5 open/close.
fn clean_mask(mask: &GrayImage) -> GrayImage {
    let opened = open(mask, Norm::LInf, 2);
    close(&opened, Norm::LInf, 2)
}

/// Severity and confidence by share of the image covered.
pub fn color_tier(affected_percent: f64) -> (Severity, f64) {
    if affected_percent > 5.0 {
        (Severity::Severe, 0.90)
    } else if affected_percent > 1.0 {
        (Severity::Moderate, 0.80)
    } else {
        (Severity::Minor, 0.70)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_class_mapping() {
        assert_eq!(MOLD_GREEN.class_name(), "Mold");
        assert_eq!(MOLD_BLACK.class_name(), "Mold");
        assert_eq!(WATER_STAIN.class_name(), "Water Damage");
        assert_eq!(WATER_DAMAGE_BROWN.class_name(), "Water Damage");
        assert_eq!(RUST.class_name(), "Rust/Corrosion");
        assert_eq!(color_range("mold_black"), Some(&MOLD_BLACK));
        assert!(color_range("paint").is_none());
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(color_tier(5.01), (Severity::Severe, 0.90));
        assert_eq!(color_tier(5.0), (Severity::Moderate, 0.80));
        assert_eq!(color_tier(1.0), (Severity::Minor, 0.70));
    }

    #[test]
    fn test_green_patch_is_mold() {
        // 50×50 patch of HSV (60, 255, 128) on a neutral (0, 0, 255) background
        let hsv = HsvImage::from_fn(200, 200, |x, y| {
            if (50..100).contains(&x) && (50..100).contains(&y) {
                Rgb([60, 255, 128])
            } else {
                Rgb([0, 0, 255])
            }
        });

        let found = detect_color_defect(&hsv, &MOLD_GREEN, 400.0, 200.0 * 200.0);
        assert_eq!(found.len(), 1);
        let det = &found[0];
        assert_eq!(det.class_name, "Mold");
        assert_eq!(det.detection_method, DetectionMethod::CvColor);
        // 49 × 49 border polygon over 40 000 pixels
        assert_eq!(det.affected_area_percent, Some(6.0));
        assert_eq!(det.severity, Some(Severity::Severe));
        assert_eq!(det.confidence, 0.90);

        assert!(detect_color_defect(&hsv, &RUST, 400.0, 40_000.0).is_empty());
    }

    #[test]
    fn test_small_patch_is_dropped() {
        let hsv = HsvImage::from_fn(100, 100, |x, y| {
            if (10..25).contains(&x) && (10..25).contains(&y) {
                Rgb([60, 255, 128])
            } else {
                Rgb([0, 0, 255])
            }
        });
        // 14 × 14 = 196 < 400
        assert!(detect_color_defect(&hsv, &MOLD_GREEN, 400.0, 10_000.0).is_empty());
    }
}
