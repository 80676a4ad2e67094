//! Structural assessment and maintenance prediction over a whole scan.

use std::collections::BTreeMap;

use safenest_models::{
    Detection, MaintenancePrediction, MaintenanceUrgency, StructuralAssessment, StructuralStatus,
    TemporalSummary,
};

use crate::scorer::canonical_class_key;

/// Crack count above which a structural review is advised.
const MULTIPLE_CRACKS: usize = 3;

/// Number of detections listed as priority maintenance items.
const PRIORITY_ITEMS: usize = 5;

/// Assess structural integrity from every detection of a scan.
///
/// Growing tracks from a temporal summary add their own concern.
pub fn structural_assessment(
    detections: &[Detection],
    temporal: Option<&TemporalSummary>,
) -> StructuralAssessment {
    let mut defect_summary: BTreeMap<String, usize> = BTreeMap::new();
    let mut by_key: BTreeMap<String, usize> = BTreeMap::new();
    for det in detections {
        *defect_summary.entry(det.class_name.clone()).or_insert(0) += 1;
        *by_key.entry(canonical_class_key(&det.class_name)).or_insert(0) += 1;
    }
    let count = |key: &str| by_key.get(key).copied().unwrap_or(0);

    let mut concerns = Vec::new();
    if count("crack") > MULTIPLE_CRACKS {
        concerns.push("Multiple cracks detected - structural review recommended".to_string());
    }
    if count("leak") > 0 || count("water_damage") > 0 {
        concerns.push("Water damage present - check for moisture infiltration".to_string());
    }
    if count("mold") > 0 || count("mould") > 0 {
        concerns.push("Mold detected - health hazard, requires remediation".to_string());
    }
    if let Some(growing) = temporal.map(|t| t.growing_defects_count).filter(|&n| n > 0) {
        concerns.push(format!(
            "{} growing defect(s) detected - active deterioration likely",
            growing
        ));
    }

    let overall_status = match concerns.len() {
        0 => StructuralStatus::Stable,
        1 | 2 => StructuralStatus::NeedsAttention,
        _ => StructuralStatus::Concerning,
    };

    let recommendation = if concerns.is_empty() {
        "No immediate action required"
    } else {
        "Professional inspection recommended"
    };

    StructuralAssessment {
        overall_status,
        defect_summary,
        concerns,
        recommendation: recommendation.to_string(),
    }
}

/// Predict a maintenance timeline from the number of detections.
pub fn maintenance_prediction(detections: &[Detection]) -> MaintenancePrediction {
    let urgency_score = detections.len() * 2;

    let urgency = if urgency_score > 20 {
        MaintenanceUrgency::Immediate
    } else if urgency_score > 10 {
        MaintenanceUrgency::WithinThreeMonths
    } else if urgency_score > 5 {
        MaintenanceUrgency::WithinSixMonths
    } else {
        MaintenanceUrgency::Routine
    };

    MaintenancePrediction {
        urgency,
        estimated_cost: urgency.cost_estimate().to_string(),
        priority_items: detections
            .iter()
            .take(PRIORITY_ITEMS)
            .map(|d| d.class_name.clone())
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use safenest_models::BoundingBox;

    fn dets(class: &str, n: usize) -> Vec<Detection> {
        (0..n)
            .map(|i| Detection::new(BoundingBox::new(i as f64, 0.0, i as f64 + 5.0, 5.0), class, 0.7))
            .collect()
    }

    #[test]
    fn test_clean_scan_is_stable() {
        let assessment = structural_assessment(&dets("crack", 2), None);
        assert_eq!(assessment.overall_status, StructuralStatus::Stable);
        assert!(assessment.concerns.is_empty());
        assert_eq!(assessment.defect_summary["crack"], 2);
        assert_eq!(assessment.recommendation, "No immediate action required");
    }

    #[test]
    fn test_concerns_escalate_status() {
        let mut all = dets("crack", 4);
        all.extend(dets("Water Damage", 1));
        let assessment = structural_assessment(&all, None);
        assert_eq!(assessment.concerns.len(), 2);
        assert_eq!(assessment.overall_status, StructuralStatus::NeedsAttention);

        all.extend(dets("Mold", 1));
        let assessment = structural_assessment(&all, None);
        assert_eq!(assessment.overall_status, StructuralStatus::Concerning);
        assert_eq!(assessment.recommendation, "Professional inspection recommended");
    }

    #[test]
    fn test_growing_tracks_add_concern() {
        let temporal = TemporalSummary {
            growing_defects_count: 2,
            ..Default::default()
        };
        let assessment = structural_assessment(&[], Some(&temporal));
        assert_eq!(assessment.concerns.len(), 1);
        assert!(assessment.concerns[0].starts_with("2 growing"));
    }

    #[test]
    fn test_maintenance_brackets() {
        assert_eq!(maintenance_prediction(&dets("stain", 2)).urgency, MaintenanceUrgency::Routine);
        assert_eq!(
            maintenance_prediction(&dets("stain", 3)).urgency,
            MaintenanceUrgency::WithinSixMonths
        );
        assert_eq!(
            maintenance_prediction(&dets("stain", 6)).urgency,
            MaintenanceUrgency::WithinThreeMonths
        );

        let immediate = maintenance_prediction(&dets("stain", 11));
        assert_eq!(immediate.urgency, MaintenanceUrgency::Immediate);
        assert_eq!(immediate.estimated_cost, "$2000-5000");
        assert_eq!(immediate.priority_items.len(), 5);
    }
}
