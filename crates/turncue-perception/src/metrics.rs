//! Metrics emitted by the perception stages.
//!
//! Uses the `metrics` facade; nothing is recorded unless the host installs
//! a recorder.

use metrics::{counter, gauge, histogram};

/// Metric names as constants for consistency.
pub mod names {
    pub const DETECTOR_MALFORMED_FRAMES_TOTAL: &str = "turncue_detector_malformed_frames_total";
    pub const DETECTOR_INFERENCE_FAILURES_TOTAL: &str = "turncue_detector_inference_failures_total";
    pub const DETECTOR_FACES_PER_FRAME: &str = "turncue_detector_faces_per_frame";
    pub const TRACKS_ACTIVE: &str = "turncue_tracks_active";
    pub const TRACKS_CREATED_TOTAL: &str = "turncue_tracks_created_total";
    pub const TRACKS_EVICTED_TOTAL: &str = "turncue_tracks_evicted_total";
    pub const ATTENTION_SCORE: &str = "turncue_attention_score";
}

/// Record a detector output buffer with the wrong length.
pub fn record_malformed_frame() {
    counter!(names::DETECTOR_MALFORMED_FRAMES_TOTAL).increment(1);
}

/// Record a failed inference call.
pub fn record_inference_failure() {
    counter!(names::DETECTOR_INFERENCE_FAILURES_TOTAL).increment(1);
}

/// Record the number of faces kept after NMS.
pub fn record_faces_per_frame(count: usize) {
    histogram!(names::DETECTOR_FACES_PER_FRAME).record(count as f64);
}

/// Record tracker population changes.
pub fn record_tracks(active: usize, created: usize, evicted: usize) {
    gauge!(names::TRACKS_ACTIVE).set(active as f64);
    if created > 0 {
        counter!(names::TRACKS_CREATED_TOTAL).increment(created as u64);
    }
    if evicted > 0 {
        counter!(names::TRACKS_EVICTED_TOTAL).increment(evicted as u64);
    }
}

/// Update the group attention gauge.
pub fn set_attention_score(score: f32) {
    gauge!(names::ATTENTION_SCORE).set(score as f64);
}
