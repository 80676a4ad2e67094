//! IoU-based tracker for following defects across video frames.
//!
//! Uses greedy matching by Intersection over Union, restricted to tracks of
//! the same class, to decide whether a detection is a defect already seen in
//! an earlier frame. Tracks are never deleted; a track that goes unmatched
//! for more than `max_dropout` frames simply stops being eligible.

use safenest_models::{BoundingBox, Detection, TemporalSummary, TrackSummary};
use tracing::debug;

use crate::config::TrackerConfig;
use crate::error::{VisionError, VisionResult};
use crate::numeric::round2;

/// Number of area samples averaged at each end of the growth window.
const GROWTH_WINDOW: usize = 3;

/// One defect followed across frames.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub track_id: u64,
    pub defect_class: String,
    pub first_frame: u64,
    pub last_frame: u64,
    pub frames_seen: u32,
    pub max_confidence: f64,
    /// Box area at every match, oldest first
    pub areas: Vec<f64>,
    pub last_bbox: BoundingBox,
}

impl Track {
    fn start(track_id: u64, det: &Detection, bbox: BoundingBox, frame_id: u64) -> Self {
        Self {
            track_id,
            defect_class: det.class_name.clone(),
            first_frame: frame_id,
            last_frame: frame_id,
            frames_seen: 1,
            max_confidence: det.unit_confidence(),
            areas: vec![bbox.area()],
            last_bbox: bbox,
        }
    }

    fn bind(&mut self, det: &Detection, bbox: BoundingBox, frame_id: u64) {
        self.areas.push(bbox.area());
        self.last_bbox = bbox;
        self.last_frame = frame_id;
        self.frames_seen += 1;
        self.max_confidence = self.max_confidence.max(det.unit_confidence());
    }

    /// Relative change between the mean of the first and last few areas.
    ///
    /// Zero with fewer than two samples or a zero baseline.
    pub fn growth_rate(&self) -> f64 {
        if self.areas.len() < 2 {
            return 0.0;
        }
        let n = GROWTH_WINDOW.min(self.areas.len());
        let start_avg = self.areas[..n].iter().sum::<f64>() / n as f64;
        let end_avg = self.areas[self.areas.len() - n..].iter().sum::<f64>() / n as f64;

        if start_avg == 0.0 {
            return 0.0;
        }
        let rate = (end_avg - start_avg) / start_avg;
        if rate.is_finite() {
            rate
        } else {
            0.0
        }
    }

    pub fn is_persistent(&self, config: &TrackerConfig) -> bool {
        self.frames_seen >= config.persistence_frames
    }

    pub fn is_growing(&self, config: &TrackerConfig) -> bool {
        self.growth_rate() > config.growth_threshold
    }
}

/// Temporal defect tracker, one per scan session.
#[derive(Debug, Clone)]
pub struct DefectTracker {
    config: TrackerConfig,
    tracks: Vec<Track>,
    next_track_id: u64,
    last_frame_id: Option<u64>,
}

impl Default for DefectTracker {
    fn default() -> Self {
        Self::new(TrackerConfig::default())
    }
}

impl DefectTracker {
    /// Create a new tracker.
    pub fn new(config: TrackerConfig) -> Self {
        Self {
            config,
            tracks: Vec::new(),
            next_track_id: 1,
            last_frame_id: None,
        }
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Update tracks with the detections of one frame.
    ///
    /// Frame ids must strictly increase across calls. Detections without a
    /// box cannot be followed and are skipped.
    pub fn update(&mut self, detections: &[Detection], frame_id: u64) -> VisionResult<()> {
        if let Some(last_frame_id) = self.last_frame_id {
            if frame_id <= last_frame_id {
                return Err(VisionError::OutOfOrderFrame {
                    frame_id,
                    last_frame_id,
                });
            }
        }
        self.last_frame_id = Some(frame_id);

        // Only tracks that existed before this frame can be matched
        let existing = self.tracks.len();
        let active: Vec<usize> = (0..existing)
            .filter(|&i| frame_id - self.tracks[i].last_frame <= self.config.max_dropout)
            .collect();
        let mut matched = vec![false; existing];

        // Strongest signals claim tracks first; the sort is stable
        let mut ordered: Vec<&Detection> = detections.iter().collect();
        ordered.sort_by(|a, b| b.unit_confidence().total_cmp(&a.unit_confidence()));

        let mut unbound: Vec<(&Detection, BoundingBox)> = Vec::new();

        for det in ordered {
            let Some(bbox) = det.bbox else {
                debug!(class = %det.class_name, frame_id, "Skipping detection without bbox");
                continue;
            };

            let mut best_iou = 0.0;
            let mut best_track: Option<usize> = None;

            for &idx in &active {
                if matched[idx] {
                    continue;
                }
                let track = &self.tracks[idx];
                if track.defect_class != det.class_name {
                    continue;
                }
                let iou = bbox.iou(&track.last_bbox);
                if iou > best_iou {
                    best_iou = iou;
                    best_track = Some(idx);
                }
            }

            match best_track {
                Some(idx) if best_iou >= self.config.iou_threshold => {
                    self.tracks[idx].bind(det, bbox, frame_id);
                    matched[idx] = true;
                    debug!(
                        track_id = self.tracks[idx].track_id,
                        iou = best_iou,
                        frame_id,
                        "Detection bound to track"
                    );
                }
                _ => unbound.push((det, bbox)),
            }
        }

        // Create new tracks for unmatched detections
        for (det, bbox) in unbound {
            let track_id = self.next_track_id;
            self.next_track_id += 1;
            debug!(track_id, class = %det.class_name, frame_id, "New track");
            self.tracks.push(Track::start(track_id, det, bbox, frame_id));
        }

        Ok(())
    }

    /// Summarize tracker state; `tracks` lists persistent tracks only.
    pub fn summary(&self) -> TemporalSummary {
        let persistent: Vec<&Track> = self
            .tracks
            .iter()
            .filter(|t| t.is_persistent(&self.config))
            .collect();

        let tracks: Vec<TrackSummary> = persistent
            .iter()
            .map(|t| TrackSummary {
                id: t.track_id,
                class_name: t.defect_class.clone(),
                frames_seen: t.frames_seen,
                growth_rate: round2(t.growth_rate()),
                is_growing: t.is_growing(&self.config),
            })
            .collect();

        TemporalSummary {
            total_tracks: self.tracks.len(),
            persistent_defects_count: persistent.len(),
            growing_defects_count: tracks.iter().filter(|t| t.is_growing).count(),
            tracks,
        }
    }

    /// All tracks in creation order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Last frame id passed to `update`.
    pub fn last_frame_id(&self) -> Option<u64> {
        self.last_frame_id
    }

    /// Reset the tracker state.
    pub fn reset(&mut self) {
        self.tracks.clear();
        self.next_track_id = 1;
        self.last_frame_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f64, y1: f64, x2: f64, y2: f64, class: &str, conf: f64) -> Detection {
        Detection::new(BoundingBox::new(x1, y1, x2, y2), class, conf)
    }

    #[test]
    fn test_tracker_new_detections() {
        let mut tracker = DefectTracker::new(TrackerConfig::default());
        tracker
            .update(
                &[
                    det(0.0, 0.0, 50.0, 50.0, "crack", 0.9),
                    det(200.0, 200.0, 250.0, 250.0, "crack", 0.8),
                ],
                0,
            )
            .unwrap();

        let ids: Vec<u64> = tracker.tracks().iter().map(|t| t.track_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(tracker.summary().total_tracks, 2);
        assert!(tracker.summary().tracks.is_empty());
    }

    #[test]
    fn test_same_box_three_frames_is_persistent() {
        let mut tracker = DefectTracker::new(TrackerConfig::default());
        for frame in 1..=3 {
            tracker
                .update(&[det(10.0, 10.0, 60.0, 60.0, "mold", 0.7)], frame)
                .unwrap();
        }

        let summary = tracker.summary();
        assert_eq!(summary.total_tracks, 1);
        assert_eq!(summary.persistent_defects_count, 1);
        assert_eq!(summary.growing_defects_count, 0);
        assert_eq!(summary.tracks[0].id, 1);
        assert_eq!(summary.tracks[0].frames_seen, 3);
        assert_eq!(summary.tracks[0].growth_rate, 0.0);
    }

    #[test]
    fn test_class_mismatch_never_binds() {
        let mut tracker = DefectTracker::new(TrackerConfig::default());
        tracker.update(&[det(0.0, 0.0, 50.0, 50.0, "crack", 0.9)], 1).unwrap();
        tracker.update(&[det(0.0, 0.0, 50.0, 50.0, "Mold", 0.9)], 2).unwrap();
        assert_eq!(tracker.tracks().len(), 2);
    }

    #[test]
    fn test_dropout_window() {
        let mut tracker = DefectTracker::new(TrackerConfig::default());
        tracker.update(&[det(0.0, 0.0, 50.0, 50.0, "crack", 0.9)], 0).unwrap();
        // gap of exactly max_dropout still matches
        tracker.update(&[det(0.0, 0.0, 50.0, 50.0, "crack", 0.9)], 5).unwrap();
        assert_eq!(tracker.tracks().len(), 1);
        assert_eq!(tracker.tracks()[0].frames_seen, 2);

        // gap of max_dropout + 1 starts a new track
        tracker.update(&[det(0.0, 0.0, 50.0, 50.0, "crack", 0.9)], 11).unwrap();
        assert_eq!(tracker.tracks().len(), 2);
        assert_eq!(tracker.tracks()[1].track_id, 2);
    }

    #[test]
    fn test_empty_updates_age_out_track() {
        let mut tracker = DefectTracker::new(TrackerConfig::default());
        tracker.update(&[det(0.0, 0.0, 50.0, 50.0, "crack", 0.9)], 0).unwrap();
        for frame in 1..=4 {
            tracker.update(&[], frame).unwrap();
        }
        tracker.update(&[det(0.0, 0.0, 50.0, 50.0, "crack", 0.9)], 5).unwrap();
        assert_eq!(tracker.tracks().len(), 1);
        assert_eq!(tracker.tracks()[0].last_frame, 5);

        for frame in 6..=11 {
            tracker.update(&[], frame).unwrap();
        }
        tracker.update(&[det(0.0, 0.0, 50.0, 50.0, "crack", 0.9)], 12).unwrap();
        assert_eq!(tracker.tracks().len(), 2);
        assert_eq!(tracker.tracks()[0].frames_seen, 2);
        assert_eq!(tracker.tracks()[1].first_frame, 12);
    }

    #[test]
    fn test_zero_baseline_growth_is_zero() {
        let mut track = Track::start(
            1,
            &det(0.0, 0.0, 10.0, 10.0, "stain", 0.5),
            BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            0,
        );
        track.areas = vec![0.0, 0.0, 50.0];
        assert_eq!(track.growth_rate(), 0.0);

        track.areas = vec![0.0, 0.0, 0.0, 50.0, 60.0, 70.0];
        assert_eq!(track.growth_rate(), 0.0);
        assert!(!track.is_growing(&TrackerConfig::default()));
    }

    #[test]
    fn test_growth_detected() {
        let mut tracker = DefectTracker::new(TrackerConfig::default());
        // 100×10 growing by 10 px per frame
        for (frame, x2) in [(1, 100.0), (2, 110.0), (3, 120.0), (4, 130.0), (5, 140.0), (6, 150.0)] {
            tracker
                .update(&[det(0.0, 0.0, x2, 10.0, "crack", 0.8)], frame)
                .unwrap();
        }

        let track = &tracker.tracks()[0];
        assert_eq!(track.frames_seen, 6);
        // first three avg 1100, last three avg 1400
        assert!((track.growth_rate() - 300.0 / 1100.0).abs() < 1e-9);

        let summary = tracker.summary();
        assert_eq!(summary.growing_defects_count, 1);
        assert!(summary.tracks[0].is_growing);
        assert_eq!(summary.tracks[0].growth_rate, 0.27);
    }

    #[test]
    fn test_highest_confidence_claims_track() {
        let mut tracker = DefectTracker::new(TrackerConfig::default());
        tracker.update(&[det(0.0, 0.0, 100.0, 100.0, "crack", 0.9)], 1).unwrap();
        tracker
            .update(
                &[
                    det(0.0, 0.0, 100.0, 100.0, "crack", 0.4),
                    det(5.0, 5.0, 100.0, 100.0, "crack", 0.95),
                ],
                2,
            )
            .unwrap();

        assert_eq!(tracker.tracks().len(), 2);
        assert_eq!(tracker.tracks()[0].max_confidence, 0.95);
        assert_eq!(tracker.tracks()[0].last_bbox, BoundingBox::new(5.0, 5.0, 100.0, 100.0));
    }

    #[test]
    fn test_out_of_order_frame_rejected() {
        let mut tracker = DefectTracker::new(TrackerConfig::default());
        tracker.update(&[], 4).unwrap();
        assert!(matches!(
            tracker.update(&[], 4),
            Err(VisionError::OutOfOrderFrame { frame_id: 4, last_frame_id: 4 })
        ));
        assert!(tracker.update(&[], 3).is_err());
    }

    #[test]
    fn test_missing_bbox_skipped_and_reset() {
        let mut tracker = DefectTracker::new(TrackerConfig::default());
        let mut no_box = det(0.0, 0.0, 10.0, 10.0, "stain", 0.5);
        no_box.bbox = None;
        tracker.update(&[no_box], 1).unwrap();
        assert!(tracker.tracks().is_empty());

        tracker.update(&[det(0.0, 0.0, 10.0, 10.0, "stain", 0.5)], 2).unwrap();
        tracker.reset();
        assert!(tracker.tracks().is_empty());
        assert_eq!(tracker.last_frame_id(), None);
        tracker.update(&[det(0.0, 0.0, 10.0, 10.0, "stain", 0.5)], 0).unwrap();
        assert_eq!(tracker.tracks()[0].track_id, 1);
    }
}
