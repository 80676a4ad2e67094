//! Scan sessions: one inspection run over an image set or a frame sequence.
//!
//! A session shares its detector and scorer through `Arc` and owns exactly
//! one tracker, so concurrent sessions never see each other's tracks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::RgbImage;
use rayon::prelude::*;
use safenest_models::{Detection, ScanId, ScoreResult, SessionReport, UserContext};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::assessment::{maintenance_prediction, structural_assessment};
use crate::config::InspectionConfig;
use crate::detector::{AnalysisResult, DefectDetector, DetectionFlags};
use crate::error::VisionResult;
use crate::merge::merge_detections;
use crate::numeric::round2;
use crate::scorer::RiskScorer;
use crate::tracker::DefectTracker;

/// Frame rate assumed when a sequence reports none.
const FALLBACK_FPS: f64 = 30.0;

/// Keep every n-th frame so roughly `target_fps` frames per second survive.
///
/// Never returns less than 1; a non-positive `fps` is treated as 30.
pub fn sample_interval(fps: f64, target_fps: f64) -> usize {
    let fps = if fps > 0.0 && fps.is_finite() { fps } else { FALLBACK_FPS };
    if !(target_fps > 0.0) || !target_fps.is_finite() {
        return 1;
    }
    let interval = (fps / target_fps).floor();
    if interval >= 1.0 {
        interval as usize
    } else {
        1
    }
}

/// Outcome of one processed frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    /// Set when the frame was fed to the tracker
    pub frame_id: Option<u64>,
    pub detections: Vec<Detection>,
    pub total_affected_percent: f64,
    pub score: ScoreResult,
}

/// One inspection run.
#[derive(Debug)]
pub struct ScanSession {
    scan_id: ScanId,
    started_at: DateTime<Utc>,
    detector: Arc<DefectDetector>,
    scorer: Arc<RiskScorer>,
    tracker: DefectTracker,
    user_context: Option<UserContext>,
    flags: DetectionFlags,
    dedup_iou: f64,
    frame_scores: Vec<ScoreResult>,
    detections: Vec<Detection>,
}

impl ScanSession {
    /// Create a session around shared detector and scorer instances.
    pub fn new(
        detector: Arc<DefectDetector>,
        scorer: Arc<RiskScorer>,
        tracker: DefectTracker,
        user_context: Option<UserContext>,
    ) -> Self {
        let scan_id = ScanId::new();
        info!(scan_id = %scan_id, "Scan session started");
        Self {
            scan_id,
            started_at: Utc::now(),
            detector,
            scorer,
            tracker,
            user_context,
            flags: DetectionFlags::all(),
            dedup_iou: InspectionConfig::default().dedup_iou,
            frame_scores: Vec::new(),
            detections: Vec::new(),
        }
    }

    /// Create a session with fresh components built from config.
    pub fn from_config(config: &InspectionConfig, user_context: Option<UserContext>) -> Self {
        Self::new(
            Arc::new(DefectDetector::new(config.detector.clone())),
            Arc::new(RiskScorer::new(config.scorer)),
            DefectTracker::new(config.tracker),
            user_context,
        )
        .with_dedup_iou(config.dedup_iou)
    }

    pub fn with_flags(mut self, flags: DetectionFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_dedup_iou(mut self, dedup_iou: f64) -> Self {
        self.dedup_iou = dedup_iou;
        self
    }

    pub fn scan_id(&self) -> &ScanId {
        &self.scan_id
    }

    pub fn tracker(&self) -> &DefectTracker {
        &self.tracker
    }

    /// Analyze and score one image. With a `frame_id` the detections are
    /// also fed to the tracker.
    pub fn process_frame(
        &mut self,
        image: &RgbImage,
        frame_id: Option<u64>,
    ) -> VisionResult<FrameReport> {
        self.process_frame_with(image, Vec::new(), frame_id)
    }

    /// Like [`process_frame`](Self::process_frame), but merges detections
    /// from an external detector ahead of the classical ones.
    pub fn process_frame_with(
        &mut self,
        image: &RgbImage,
        external: Vec<Detection>,
        frame_id: Option<u64>,
    ) -> VisionResult<FrameReport> {
        let analysis = self.detector.analyze(image, self.flags)?;
        self.record(analysis, external, image_area(image), frame_id)
    }

    /// Score detections produced entirely outside this crate.
    pub fn process_detections(
        &mut self,
        detections: Vec<Detection>,
        image_area: u64,
        frame_id: Option<u64>,
    ) -> VisionResult<FrameReport> {
        let score = self
            .scorer
            .calculate_score(&detections, image_area, self.user_context.as_ref())?;
        if let Some(frame_id) = frame_id {
            self.tracker.update(&detections, frame_id)?;
        }
        let total_affected_percent = round2(
            detections
                .iter()
                .filter_map(|d| d.affected_area_percent)
                .sum(),
        );
        Ok(self.push(frame_id, detections, total_affected_percent, score))
    }

    /// Analyze many images in parallel, then score and track them in order.
    ///
    /// With `first_frame_id`, image `i` is tracked as frame
    /// `first_frame_id + i`.
    pub fn analyze_batch(
        &mut self,
        images: &[RgbImage],
        first_frame_id: Option<u64>,
    ) -> VisionResult<Vec<FrameReport>> {
        let detector = Arc::clone(&self.detector);
        let flags = self.flags;
        let analyses: Vec<AnalysisResult> = images
            .par_iter()
            .map(|image| detector.analyze(image, flags))
            .collect::<VisionResult<_>>()?;

        debug!(scan_id = %self.scan_id, frames = analyses.len(), "Batch analyzed");

        images
            .iter()
            .zip(analyses)
            .enumerate()
            .map(|(i, (image, analysis))| {
                let frame_id = first_frame_id.map(|first| first + i as u64);
                self.record(analysis, Vec::new(), image_area(image), frame_id)
            })
            .collect()
    }

    fn record(
        &mut self,
        analysis: AnalysisResult,
        external: Vec<Detection>,
        image_area: u64,
        frame_id: Option<u64>,
    ) -> VisionResult<FrameReport> {
        let detections = merge_detections(external, analysis.defects, self.dedup_iou);

        self.process_detections(detections, image_area, frame_id)
    }

    fn push(
        &mut self,
        frame_id: Option<u64>,
        detections: Vec<Detection>,
        total_affected_percent: f64,
        score: ScoreResult,
    ) -> FrameReport {
        info!(
            scan_id = %self.scan_id,
            frame_id = ?frame_id,
            score = score.score,
            defect_count = detections.len(),
            "Frame processed"
        );
        self.detections.extend(detections.iter().cloned());
        self.frame_scores.push(score.clone());
        FrameReport {
            frame_id,
            detections,
            total_affected_percent,
            score,
        }
    }

    /// Close the session and build its report.
    pub fn finish(self) -> SessionReport {
        let aggregate = self.scorer.aggregate_scores(&self.frame_scores);
        let temporal_analysis = self
            .tracker
            .last_frame_id()
            .map(|_| self.tracker.summary());
        let structural_assessment =
            structural_assessment(&self.detections, temporal_analysis.as_ref());
        let maintenance_prediction = maintenance_prediction(&self.detections);

        info!(
            scan_id = %self.scan_id,
            frames = aggregate.frames_analyzed,
            score = aggregate.score,
            risk_level = %aggregate.risk_level,
            "Scan session finished"
        );

        SessionReport {
            scan_id: self.scan_id,
            started_at: self.started_at,
            finished_at: Utc::now(),
            user_context: self.user_context,
            frame_scores: self.frame_scores,
            aggregate,
            temporal_analysis,
            structural_assessment,
            maintenance_prediction,
        }
    }
}

fn image_area(image: &RgbImage) -> u64 {
    image.width() as u64 * image.height() as u64
}
