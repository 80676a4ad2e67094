//! Axis-aligned bounding boxes in pixel coordinates.

use schemars::gen::SchemaGenerator;
use schemars::schema::Schema;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Bounding box as corner coordinates `(x1, y1)`–`(x2, y2)`.
///
/// Serialized as a 4-element array `[x1, y1, x2, y2]`, the shape external
/// detectors already produce. A box is only meaningful when `x1 < x2` and
/// `y1 < y2`; degenerate boxes are tolerated and report zero area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 4]", into = "[f64; 4]")]
pub struct BoundingBox {
    /// Left edge x-coordinate
    pub x1: f64,
    /// Top edge y-coordinate
    pub y1: f64,
    /// Right edge x-coordinate
    pub x2: f64,
    /// Bottom edge y-coordinate
    pub y2: f64,
}

impl BoundingBox {
    /// Create a new bounding box from corner coordinates.
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// Create a box from its top-left corner and size.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Box width (may be negative for degenerate boxes).
    #[inline]
    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    /// Box height (may be negative for degenerate boxes).
    #[inline]
    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// True when both extents are positive and all coordinates are finite.
    pub fn is_valid(&self) -> bool {
        self.x1.is_finite()
            && self.y1.is_finite()
            && self.x2.is_finite()
            && self.y2.is_finite()
            && self.x1 < self.x2
            && self.y1 < self.y2
    }

    /// Box area in pixels, zero for degenerate boxes.
    #[inline]
    pub fn area(&self) -> f64 {
        if self.is_valid() {
            self.width() * self.height()
        } else {
            0.0
        }
    }

    /// Compute Intersection over Union with another box.
    ///
    /// Returns 0.0 when the boxes do not overlap or either has no area.
    pub fn iou(&self, other: &BoundingBox) -> f64 {
        let area_a = self.area();
        let area_b = other.area();
        if area_a <= 0.0 || area_b <= 0.0 {
            return 0.0;
        }

        let x1 = self.x1.max(other.x1);
        let y1 = self.y1.max(other.y1);
        let x2 = self.x2.min(other.x2);
        let y2 = self.y2.min(other.y2);

        if x2 <= x1 || y2 <= y1 {
            return 0.0;
        }

        let intersection = (x2 - x1) * (y2 - y1);
        let union = area_a + area_b - intersection;

        if union > 0.0 {
            (intersection / union).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Clamp the box to frame boundaries.
    ///
    /// Returns `None` when the clamped box would be empty, so callers never
    /// hold a box that violates `x1 < x2` / `y1 < y2`.
    pub fn clamp(&self, frame_width: u32, frame_height: u32) -> Option<BoundingBox> {
        let frame_width = frame_width as f64;
        let frame_height = frame_height as f64;

        let clamped = BoundingBox {
            x1: self.x1.max(0.0).min(frame_width),
            y1: self.y1.max(0.0).min(frame_height),
            x2: self.x2.max(0.0).min(frame_width),
            y2: self.y2.max(0.0).min(frame_height),
        };

        clamped.is_valid().then_some(clamped)
    }

    /// Corner coordinates truncated to integer pixels, for drawing.
    pub fn to_pixels(&self) -> (i32, i32, i32, i32) {
        (self.x1 as i32, self.y1 as i32, self.x2 as i32, self.y2 as i32)
    }
}

impl From<[f64; 4]> for BoundingBox {
    fn from(v: [f64; 4]) -> Self {
        Self::new(v[0], v[1], v[2], v[3])
    }
}

impl From<BoundingBox> for [f64; 4] {
    fn from(b: BoundingBox) -> Self {
        [b.x1, b.y1, b.x2, b.y2]
    }
}

impl JsonSchema for BoundingBox {
    fn schema_name() -> String {
        "BoundingBox".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        <[f64; 4]>::json_schema(gen)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iou_identical() {
        let b = BoundingBox::new(10.0, 20.0, 110.0, 70.0);
        assert!((b.iou(&b) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_iou_disjoint() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        assert_eq!(a.iou(&b), 0.0);

        // Touching edges share no area
        let c = BoundingBox::new(10.0, 0.0, 20.0, 10.0);
        assert_eq!(a.iou(&c), 0.0);
    }

    #[test]
    fn test_iou_symmetric_partial_overlap() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 0.0, 15.0, 10.0);
        // intersection 50, union 150
        assert!((a.iou(&b) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(a.iou(&b), b.iou(&a));
    }

    #[test]
    fn test_degenerate_box_has_zero_area_and_iou() {
        let flat = BoundingBox::new(5.0, 5.0, 5.0, 20.0);
        let inverted = BoundingBox::new(10.0, 10.0, 0.0, 0.0);
        let normal = BoundingBox::new(0.0, 0.0, 10.0, 20.0);

        assert_eq!(flat.area(), 0.0);
        assert_eq!(inverted.area(), 0.0);
        assert_eq!(flat.iou(&normal), 0.0);
        assert_eq!(normal.iou(&inverted), 0.0);
    }

    #[test]
    fn test_clamp_to_frame() {
        let b = BoundingBox::new(-3.0, 2.0, 98.0, 150.0);
        let clamped = b.clamp(100, 100).unwrap();
        assert_eq!(clamped, BoundingBox::new(0.0, 2.0, 98.0, 100.0));
        assert!(clamped.is_valid());
    }

    #[test]
    fn test_clamp_outside_frame_is_none() {
        let b = BoundingBox::new(120.0, 10.0, 150.0, 40.0);
        assert!(b.clamp(100, 100).is_none());
    }

    #[test]
    fn test_serde_array_shape() {
        let b = BoundingBox::new(1.0, 2.0, 3.0, 4.0);
        let json = serde_json::to_string(&b).unwrap();
        assert_eq!(json, "[1.0,2.0,3.0,4.0]");

        let parsed: BoundingBox = serde_json::from_str("[1, 2, 3, 4]").unwrap();
        assert_eq!(parsed, b);
    }
}
