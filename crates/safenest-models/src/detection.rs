//! Defect detection records.
//!
//! A `Detection` is the uniform record exchanged between the classical
//! detector, external ML/cloud detectors, the tracker and the scorer.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

use crate::BoundingBox;

/// Coarse severity bucket derived from detection size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Minor,
    Moderate,
    Severe,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Severe => "severe",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Provenance tag for a detection. Informational only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMethod {
    /// Canny edge / contour crack detector
    CvEdge,
    /// HSV color-range detector
    CvColor,
    /// Local YOLO segmentation model
    Yolo,
    /// Cloud inference service
    Roboflow,
    /// Any other source
    #[default]
    #[serde(other)]
    External,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::CvEdge => "cv_edge",
            DetectionMethod::CvColor => "cv_color",
            DetectionMethod::Yolo => "yolo",
            DetectionMethod::Roboflow => "roboflow",
            DetectionMethod::External => "external",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One located defect candidate in a single image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Detection {
    /// Pixel-space box. `None` when the source supplied no usable box;
    /// such detections count as zero area in every geometric computation.
    #[serde(default, deserialize_with = "deserialize_bbox")]
    #[schemars(with = "Option<BoundingBox>")]
    pub bbox: Option<BoundingBox>,

    /// Open class identifier, e.g. "crack" or "Mold"
    #[serde(rename = "class")]
    pub class_name: String,

    /// Detection confidence [0, 1]
    pub confidence: f64,

    /// Severity tier, when the source derived one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<Severity>,

    /// Share of the image covered by the defect, in percent [0, 100]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affected_area_percent: Option<f64>,

    /// Where the detection came from
    #[serde(default)]
    pub detection_method: DetectionMethod,
}

impl Detection {
    /// Create a detection with a box, class and confidence.
    ///
    /// Confidence is clamped into [0, 1].
    pub fn new(bbox: BoundingBox, class_name: impl Into<String>, confidence: f64) -> Self {
        Self {
            bbox: Some(bbox),
            class_name: class_name.into(),
            confidence: clamp_unit(confidence),
            severity: None,
            affected_area_percent: None,
            detection_method: DetectionMethod::External,
        }
    }

    /// Set the severity tier.
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Set the affected area share, clamped into [0, 100].
    pub fn with_affected_area(mut self, percent: f64) -> Self {
        self.affected_area_percent = Some(if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        });
        self
    }

    /// Set the provenance tag.
    pub fn with_method(mut self, method: DetectionMethod) -> Self {
        self.detection_method = method;
        self
    }

    /// Confidence guaranteed to lie in [0, 1], even for records built by
    /// external code that bypassed the constructor.
    pub fn unit_confidence(&self) -> f64 {
        clamp_unit(self.confidence)
    }

    /// Box area in pixels; zero when the box is missing or degenerate.
    pub fn area(&self) -> f64 {
        self.bbox.map(|b| b.area()).unwrap_or(0.0)
    }

    /// IoU against another detection's box; zero when either box is missing.
    pub fn iou(&self, other: &Detection) -> f64 {
        match (&self.bbox, &other.bbox) {
            (Some(a), Some(b)) => a.iou(b),
            _ => 0.0,
        }
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_finite() {
        value.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Any JSON value in the `bbox` slot; only a numeric array is usable.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBbox {
    Coords(Vec<f64>),
    Other(serde::de::IgnoredAny),
}

/// Accept any value for `bbox`; anything other than four finite numbers
/// becomes `None` instead of failing the whole record.
fn deserialize_bbox<'de, D>(deserializer: D) -> Result<Option<BoundingBox>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<RawBbox> = Option::deserialize(deserializer)?;
    Ok(match raw {
        Some(RawBbox::Coords(v)) => match v.as_slice() {
            [x1, y1, x2, y2] if v.iter().all(|c| c.is_finite()) => {
                Some(BoundingBox::new(*x1, *y1, *x2, *y2))
            }
            _ => None,
        },
        Some(RawBbox::Other(_)) | None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_record_round_trip() {
        let json = r#"{
            "bbox": [10, 20, 110, 220],
            "class": "crack",
            "confidence": 0.82,
            "detection_method": "yolo"
        }"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.class_name, "crack");
        assert_eq!(det.bbox, Some(BoundingBox::new(10.0, 20.0, 110.0, 220.0)));
        assert_eq!(det.detection_method, DetectionMethod::Yolo);
        assert!(det.affected_area_percent.is_none());
        assert_eq!(det.area(), 100.0 * 200.0);
    }

    #[test]
    fn test_malformed_bbox_becomes_none() {
        let json = r#"{"bbox": [1, 2, 3], "class": "mold", "confidence": 0.5}"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert!(det.bbox.is_none());
        assert_eq!(det.area(), 0.0);

        let missing = r#"{"class": "mold", "confidence": 0.5}"#;
        let det: Detection = serde_json::from_str(missing).unwrap();
        assert!(det.bbox.is_none());

        for bbox in [r#"[1, "x", 3, 4]"#, "{}", r#""10,20,30,40""#, "null"] {
            let json = format!(r#"{{"bbox": {}, "class": "leak", "confidence": 0.7}}"#, bbox);
            let det: Detection = serde_json::from_str(&json).unwrap();
            assert!(det.bbox.is_none());
            assert_eq!(det.class_name, "leak");
        }
    }

    #[test]
    fn test_unknown_method_maps_to_external() {
        let json = r#"{"class": "leak", "confidence": 0.5, "detection_method": "thermal_cam"}"#;
        let det: Detection = serde_json::from_str(json).unwrap();
        assert_eq!(det.detection_method, DetectionMethod::External);
    }

    #[test]
    fn test_confidence_clamped() {
        let det = Detection::new(BoundingBox::new(0.0, 0.0, 1.0, 1.0), "crack", 1.7);
        assert_eq!(det.confidence, 1.0);

        let mut raw = det.clone();
        raw.confidence = -0.3;
        assert_eq!(raw.unit_confidence(), 0.0);
    }
}
