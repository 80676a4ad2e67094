//! Combining detections from more than one detector.

use safenest_models::Detection;
use tracing::debug;

/// Keep every `primary` detection and append the `secondary` detections that
/// do not duplicate one already kept.
///
/// A secondary detection is a duplicate when its box IoU with any kept
/// detection is at least `dedup_iou`. With the default of 1.0 only identical
/// boxes are dropped. Detections without a box are never duplicates.
pub fn merge_detections(
    primary: Vec<Detection>,
    secondary: Vec<Detection>,
    dedup_iou: f64,
) -> Vec<Detection> {
    let mut merged = primary;
    merged.reserve(secondary.len());

    for det in secondary {
        let duplicate = det.bbox.is_some()
            && merged
                .iter()
                .any(|kept| kept.bbox.is_some() && is_duplicate(kept, &det, dedup_iou));

        if duplicate {
            debug!(class = %det.class_name, "Dropping duplicate detection");
        } else {
            merged.push(det);
        }
    }

    merged
}

fn is_duplicate(kept: &Detection, candidate: &Detection, dedup_iou: f64) -> bool {
    if kept.bbox == candidate.bbox {
        return true;
    }
    kept.iou(candidate) >= dedup_iou
}
