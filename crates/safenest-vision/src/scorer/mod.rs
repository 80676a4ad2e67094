//! Explainable 0–100 safety scoring.
//!
//! ```text
//! score = round(clamp(base − (min(Σ defect_penalty, max_defects_penalty) + age_penalty), 0, 100))
//!
//! defect_penalty = (severity·3 + area_factor·area_multiplier)
//!                  · (confidence·w + (1 − w))
//!                  · climate_multiplier
//! ```
//!
//! Every defect contributes a penalty entry so callers can show why a score
//! came out the way it did.

pub mod weights;

use std::collections::BTreeMap;

use safenest_models::{
    DefectPenalty, Detection, PenaltyBreakdown, RiskLevel, ScoreResult, SessionAggregate,
    UserContext,
};
use tracing::{debug, info};

use crate::config::ScorerConfig;
use crate::error::{VisionError, VisionResult};
use crate::numeric::{round2, round_score};

pub use weights::{
    age_penalty, canonical_class_key, class_key, climate_multiplier, defect_weight, DefectWeight,
};

/// Stateless risk scorer.
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    config: ScorerConfig,
}

impl RiskScorer {
    pub fn new(config: ScorerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScorerConfig {
        &self.config
    }

    /// Score one frame's detections.
    ///
    /// `image_area` is only used for detections without an affected-area
    /// share, but must be non-zero whenever detections are present.
    pub fn calculate_score(
        &self,
        detections: &[Detection],
        image_area: u64,
        user_context: Option<&UserContext>,
    ) -> VisionResult<ScoreResult> {
        if detections.is_empty() {
            metrics::histogram!("safenest_frame_score").record(100.0);
            return Ok(ScoreResult::perfect());
        }
        if image_area == 0 {
            return Err(VisionError::validation(
                "image_area must be positive when detections are present",
            ));
        }

        let climate = user_context
            .map(|ctx| ctx.climate_or_default())
            .unwrap_or_default();

        let mut breakdown = Vec::with_capacity(detections.len());
        let mut by_defect_type: BTreeMap<String, f64> = BTreeMap::new();
        let mut defects_total = 0.0;

        for det in detections {
            let key = if self.config.canonical_class_names {
                canonical_class_key(&det.class_name)
            } else {
                class_key(&det.class_name)
            };
            let weight = defect_weight(&key);
            let climate_mult = climate_multiplier(climate, &key);
            let confidence = det.unit_confidence();

            let area_factor = match det.affected_area_percent {
                Some(percent) if percent.is_finite() => percent / 10.0,
                _ => det.area() / image_area as f64 * 10.0,
            };

            let penalty = self.defect_penalty(&weight, area_factor, confidence, climate_mult);
            defects_total += penalty;
            *by_defect_type.entry(key.clone()).or_insert(0.0) += penalty;

            debug!(class = %key, penalty, area_factor, climate_mult, "Defect penalty");

            breakdown.push(DefectPenalty {
                defect_type: key,
                confidence: round2(confidence),
                penalty: round2(penalty),
                severity: weight.severity,
                description: weight.description.to_string(),
                climate_adjusted: climate_mult != 1.0,
            });
        }

        let age = user_context
            .and_then(|ctx| ctx.building_age)
            .map(age_penalty)
            .unwrap_or(0.0);

        let defects_capped = defects_total.min(self.config.max_defects_penalty);
        let total_penalty = defects_capped + age;
        let score = round_score(self.config.base_score - total_penalty);
        let risk_level = RiskLevel::from_score(score);

        metrics::histogram!("safenest_frame_score").record(score as f64);
        info!(
            score,
            risk_level = %risk_level,
            defect_count = detections.len(),
            total_penalty,
            "Risk score calculated"
        );

        Ok(ScoreResult {
            score,
            risk_level,
            defect_count: detections.len(),
            total_penalty: round2(total_penalty),
            penalty_breakdown: PenaltyBreakdown {
                defects: round2(defects_capped),
                age_factor: round2(age),
                by_defect_type: by_defect_type
                    .into_iter()
                    .map(|(k, v)| (k, round2(v)))
                    .collect(),
            },
            breakdown,
            summary: risk_level.summary().to_string(),
            recommended_actions: risk_level
                .recommended_actions()
                .iter()
                .map(|s| s.to_string())
                .collect(),
            user_context_applied: user_context.is_some(),
        })
    }

    fn defect_penalty(
        &self,
        weight: &DefectWeight,
        area_factor: f64,
        confidence: f64,
        climate_mult: f64,
    ) -> f64 {
        let base_penalty = weight.severity * 3.0;
        let area_penalty = area_factor.max(0.0) * weight.area_multiplier;
        let w = self.config.confidence_weight;
        let confidence_factor = confidence * w + (1.0 - w);
        (base_penalty + area_penalty) * confidence_factor * climate_mult
    }

    /// Combine per-frame results; the worst frame sets the score.
    pub fn aggregate_scores(&self, results: &[ScoreResult]) -> SessionAggregate {
        if results.is_empty() {
            return SessionAggregate {
                score: 100,
                average_score: 100,
                risk_level: RiskLevel::Low,
                frames_analyzed: 0,
                total_defects_found: 0,
                defect_breakdown: Vec::new(),
            };
        }

        let min_score = results.iter().map(|r| r.score).min().unwrap_or(100);
        let mean = results.iter().map(|r| r.score as f64).sum::<f64>() / results.len() as f64;

        SessionAggregate {
            score: min_score,
            average_score: round_score(mean),
            risk_level: RiskLevel::from_score(min_score),
            frames_analyzed: results.len(),
            total_defects_found: results.iter().map(|r| r.defect_count).sum(),
            defect_breakdown: results
                .iter()
                .flat_map(|r| r.breakdown.iter().cloned())
                .collect(),
        }
    }
}
