//! Crack detection from edge structure.
//!
//! Cracks show up as thin, elongated edge clusters. The pipeline blurs,
//! boosts local contrast, extracts Canny edges, bridges small gaps with a
//! dilation and then keeps only contours that are both elongated and thin.

use image::GrayImage;
use imageproc::distance_transform::Norm;
use imageproc::edges::canny;
use imageproc::filter::gaussian_blur_f32;
use imageproc::morphology::dilate;
use safenest_models::{BoundingBox, Detection, DetectionMethod, Severity};
use tracing::debug;

use super::preprocess::{clahe, external_contours, ContourShape};
use crate::config::{DetectionThresholds, DetectorConfig};
use crate::numeric::round2;

/// Class label emitted for crack detections.
pub const CRACK_CLASS: &str = "crack";

/// Detect crack candidates in a grayscale image.
pub fn detect_cracks(gray: &GrayImage, config: &DetectorConfig, total_pixels: f64) -> Vec<Detection> {
    let thresholds = config.thresholds();

    let blurred = gaussian_blur_f32(gray, config.blur_sigma);
    let enhanced = clahe(&blurred, config.clahe_clip_limit, config.clahe_grid);
    // canny blurs again (sigma 1.4) and thresholds an L2 gradient magnitude
    let edges = canny(&enhanced, thresholds.edge_low, thresholds.edge_high);

    // LInf radius 2 equals two passes of a 3×3 square kernel
    let dilated = dilate(&edges, Norm::LInf, 2);

    external_contours(&dilated)
        .into_iter()
        .filter_map(|shape| {
            let (severity, confidence) = classify_crack(&shape, &thresholds, config)?;
            let affected = round2(100.0 * shape.area / total_pixels);
            Some(
                Detection::new(shape_bbox(&shape), CRACK_CLASS, confidence)
                    .with_severity(severity)
                    .with_affected_area(affected)
                    .with_method(DetectionMethod::CvEdge),
            )
        })
        .collect()
}

/// Decide whether a contour looks like a crack.
///
/// Returns the severity tier and confidence for accepted contours. A contour
/// must reach the minimum area, be elongated (`aspect_ratio` above the
/// configured minimum) and thin (area/perimeter below the configured maximum).
pub fn classify_crack(
    shape: &ContourShape,
    thresholds: &DetectionThresholds,
    config: &DetectorConfig,
) -> Option<(Severity, f64)> {
    if shape.area < thresholds.min_area {
        return None;
    }

    let aspect_ratio = shape.aspect_ratio();
    if aspect_ratio <= config.crack_min_aspect_ratio {
        debug!(aspect_ratio, area = shape.area, "Rejected crack candidate: not elongated");
        return None;
    }

    if shape.perimeter <= 0.0
        || shape.area / shape.perimeter >= config.crack_max_area_perimeter_ratio
    {
        debug!(
            area = shape.area,
            perimeter = shape.perimeter,
            "Rejected crack candidate: too thick"
        );
        return None;
    }

    Some(crack_tier(shape.max_dimension()))
}

/// Severity and confidence by the longest bounding-box side.
pub fn crack_tier(max_dimension: u32) -> (Severity, f64) {
    if max_dimension > 200 {
        (Severity::Severe, 0.85)
    } else if max_dimension > 100 {
        (Severity::Moderate, 0.75)
    } else {
        (Severity::Minor, 0.65)
    }
}

pub(crate) fn shape_bbox(shape: &ContourShape) -> BoundingBox {
    BoundingBox::from_xywh(
        shape.x as f64,
        shape.y as f64,
        shape.width as f64,
        shape.height as f64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shape(area: f64, perimeter: f64, width: u32, height: u32) -> ContourShape {
        ContourShape {
            area,
            perimeter,
            x: 0,
            y: 0,
            width,
            height,
        }
    }

    #[test]
    fn test_rejects_small_area() {
        let config = DetectorConfig::default();
        let t = config.thresholds();
        assert!(classify_crack(&shape(199.0, 100.0, 150, 4), &t, &config).is_none());
    }

    #[test]
    fn test_rejects_blobs_regardless_of_area() {
        let config = DetectorConfig::default();
        let t = config.thresholds();
        // aspect = 40 / 21 < 2
        assert!(classify_crack(&shape(600.0, 200.0, 40, 20), &t, &config).is_none());
        // aspect = 300 / 151 just under 2, still rejected with a huge area
        assert!(classify_crack(&shape(1.0e6, 1.0e6, 300, 150), &t, &config).is_none());
        // aspect exactly 2.0 is not strictly greater
        assert!(classify_crack(&shape(500.0, 500.0, 20, 9), &t, &config).is_none());
    }

    #[test]
    fn test_rejects_thick_contours() {
        let config = DetectorConfig::default();
        let t = config.thresholds();
        // area / perimeter = 15
        assert!(classify_crack(&shape(3000.0, 200.0, 120, 20), &t, &config).is_none());
        assert!(classify_crack(&shape(3000.0, 0.0, 120, 20), &t, &config).is_none());
    }

    #[test]
    fn test_accepts_thin_elongated_contours() {
        let config = DetectorConfig::default();
        let t = config.thresholds();
        assert_eq!(
            classify_crack(&shape(1200.0, 500.0, 250, 6), &t, &config),
            Some((Severity::Severe, 0.85))
        );
        assert_eq!(
            classify_crack(&shape(800.0, 300.0, 6, 150), &t, &config),
            Some((Severity::Moderate, 0.75))
        );
        assert_eq!(
            classify_crack(&shape(300.0, 150.0, 60, 6), &t, &config),
            Some((Severity::Minor, 0.65))
        );
    }

    #[test]
    fn test_tier_boundaries() {
        assert_eq!(crack_tier(200).0, Severity::Moderate);
        assert_eq!(crack_tier(201).0, Severity::Severe);
        assert_eq!(crack_tier(100).0, Severity::Minor);
        assert_eq!(crack_tier(101).0, Severity::Moderate);
    }
}
