//! Metrics for the turn-taking loop.

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};
use turncue_models::{CueKind, TurnState};

/// Install the Prometheus recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    pub const CUES_FIRED_TOTAL: &str = "turncue_cues_fired_total";
    pub const CUES_SUPPRESSED_TOTAL: &str = "turncue_cues_suppressed_total";
    pub const TURN_TRANSITIONS_TOTAL: &str = "turncue_turn_transitions_total";
    pub const DISPATCH_FAILURES_TOTAL: &str = "turncue_dispatch_failures_total";
    pub const EVENT_LOG_FAILURES_TOTAL: &str = "turncue_event_log_failures_total";
    pub const TICK_DURATION_SECONDS: &str = "turncue_tick_duration_seconds";
}

/// Record a fired cue.
pub fn record_cue(kind: CueKind) {
    let labels = [("kind", kind.as_str().to_string())];
    counter!(names::CUES_FIRED_TOTAL, &labels).increment(1);
}

/// Record a cue held back by its cooldown.
pub fn record_cue_suppressed(kind: CueKind) {
    let labels = [("kind", kind.as_str().to_string())];
    counter!(names::CUES_SUPPRESSED_TOTAL, &labels).increment(1);
}

/// Record an orchestrator state change.
pub fn record_transition(from: TurnState, to: TurnState) {
    let labels = [
        ("from", from.as_str().to_string()),
        ("to", to.as_str().to_string()),
    ];
    counter!(names::TURN_TRANSITIONS_TOTAL, &labels).increment(1);
}

/// Record a channel delivery failure.
pub fn record_dispatch_failure(channel: &str) {
    let labels = [("channel", channel.to_string())];
    counter!(names::DISPATCH_FAILURES_TOTAL, &labels).increment(1);
}

/// Record a failed event log write.
pub fn record_event_log_failure() {
    counter!(names::EVENT_LOG_FAILURES_TOTAL).increment(1);
}

/// Record the wall time spent in one pipeline tick.
pub fn record_tick_duration(duration_secs: f64) {
    histogram!(names::TICK_DURATION_SECONDS).record(duration_secs);
}
