//! Temporal tracking summary records.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reporting view of one persistent track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrackSummary {
    pub id: u64,
    #[serde(rename = "class")]
    pub class_name: String,
    pub frames_seen: u32,
    /// Growth rate rounded to 2 decimals
    pub growth_rate: f64,
    pub is_growing: bool,
}

/// Session-level view of the tracker state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct TemporalSummary {
    /// Every track ever created in the session
    pub total_tracks: usize,
    /// Tracks seen in at least 3 frames
    pub persistent_defects_count: usize,
    /// Persistent tracks whose area grew by more than 5%
    pub growing_defects_count: usize,
    /// Persistent tracks only
    pub tracks: Vec<TrackSummary>,
}
