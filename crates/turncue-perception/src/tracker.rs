//! IoU tracker with dwell hysteresis on the "looked" state.
//!
//! Detections are associated with tracks by global greedy IoU matching.
//! Each track owns its One-Euro filters and frontal dwell counters; only
//! read-only [`TrackSnapshot`]s leave the tracker.

use tracing::{debug, trace};
use turncue_models::{Detection, Point2, Rect, TrackId, TrackSnapshot};

use crate::config::{FrontalConfig, SmoothingConfig, TrackerConfig};
use crate::frontal::{FrontalClassifier, FrontalMeasurement};
use crate::metrics;
use crate::smoothing::OneEuroFilter2;

/// Per-track point filters.
#[derive(Debug, Clone)]
struct TrackFilters {
    center: OneEuroFilter2,
    size: OneEuroFilter2,
    right_eye: OneEuroFilter2,
    left_eye: OneEuroFilter2,
    nose: OneEuroFilter2,
}

impl TrackFilters {
    fn new(config: SmoothingConfig) -> Self {
        Self {
            center: OneEuroFilter2::new(config),
            size: OneEuroFilter2::new(config),
            right_eye: OneEuroFilter2::new(config),
            left_eye: OneEuroFilter2::new(config),
            nose: OneEuroFilter2::new(config),
        }
    }
}

/// Track information.
#[derive(Debug, Clone)]
struct Track {
    id: TrackId,
    /// Smoothed bounding box
    rect: Rect,
    /// Tracker clock at the last match
    last_seen: f64,
    looked: bool,
    measurement: FrontalMeasurement,
    /// Continuous frontal time
    look_hold: f32,
    /// Continuous non-frontal time
    not_hold: f32,
    filters: TrackFilters,
}

impl Track {
    fn snapshot(&self, now: f64) -> TrackSnapshot {
        TrackSnapshot {
            id: self.id,
            rect: self.rect,
            looked: self.looked,
            frontal: self.measurement.frontal,
            roll_deg: self.measurement.roll_deg,
            nose_asym_x: self.measurement.nose_asym_x,
            seconds_since_seen: (now - self.last_seen) as f32,
        }
    }
}

/// Multi-face tracker.
pub struct Tracker {
    config: TrackerConfig,
    smoothing: SmoothingConfig,
    classifier: FrontalClassifier,
    /// Live tracks in creation order
    tracks: Vec<Track>,
    next_track_id: TrackId,
    /// Seconds since construction, advanced by `update`
    clock: f64,
}

impl Tracker {
    /// Create a new tracker.
    pub fn new(config: TrackerConfig, frontal: FrontalConfig, smoothing: SmoothingConfig) -> Self {
        Self {
            config,
            smoothing,
            classifier: FrontalClassifier::new(frontal),
            tracks: Vec::new(),
            next_track_id: 0,
            clock: 0.0,
        }
    }

    /// Advance by `dt` seconds and fold in this frame's detections.
    ///
    /// Pass an empty slice for frames without faces or without a camera
    /// frame at all; unmatched tracks then age out after the timeout.
    pub fn update(&mut self, dt: f32, detections: &[Detection]) -> Vec<TrackSnapshot> {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.clock += dt as f64;

        let candidates: Vec<&Detection> = detections
            .iter()
            .filter(|d| d.rect.min_side() >= self.config.min_track_side_px)
            .collect();

        // Global greedy matching: best IoU pairs first
        let mut pairs: Vec<(usize, usize, f32)> = Vec::new();
        for (ti, track) in self.tracks.iter().enumerate() {
            for (di, det) in candidates.iter().enumerate() {
                let iou = track.rect.iou(&det.rect);
                if iou >= self.config.match_iou && iou > 0.0 {
                    pairs.push((ti, di, iou));
                }
            }
        }
        pairs.sort_by(|a, b| b.2.total_cmp(&a.2));

        let mut track_used = vec![false; self.tracks.len()];
        let mut det_used = vec![false; candidates.len()];
        for (ti, di, _iou) in pairs {
            if track_used[ti] || det_used[di] {
                continue;
            }
            track_used[ti] = true;
            det_used[di] = true;
            self.apply_match(ti, candidates[di], dt);
        }

        // Evict stale tracks before spawning so freed slots are reusable
        let now = self.clock;
        let timeout = self.config.track_timeout_sec as f64;
        let before = self.tracks.len();
        self.tracks.retain(|t| {
            let keep = now - t.last_seen <= timeout;
            if !keep {
                debug!(track_id = t.id, "Evicting stale track");
            }
            keep
        });
        let evicted = before - self.tracks.len();

        let mut created = 0;
        for (di, det) in candidates.iter().enumerate() {
            if det_used[di] {
                continue;
            }
            if self.tracks.len() >= self.config.max_tracks {
                trace!(max_tracks = self.config.max_tracks, "Track capacity reached");
                break;
            }
            self.spawn(det);
            created += 1;
        }

        metrics::record_tracks(self.tracks.len(), created, evicted);
        self.snapshots()
    }

    /// Snapshots of all live tracks, ordered by id.
    pub fn snapshots(&self) -> Vec<TrackSnapshot> {
        self.tracks.iter().map(|t| t.snapshot(self.clock)).collect()
    }

    /// Number of live tracks.
    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Drop every track. Ids keep increasing.
    pub fn reset(&mut self) {
        self.tracks.clear();
    }

    fn spawn(&mut self, det: &Detection) {
        let id = self.next_track_id;
        self.next_track_id = self.next_track_id.wrapping_add(1);

        let mut track = Track {
            id,
            rect: det.rect,
            last_seen: self.clock,
            looked: false,
            measurement: FrontalMeasurement::default(),
            look_hold: 0.0,
            not_hold: 0.0,
            filters: TrackFilters::new(self.smoothing),
        };
        observe(&self.classifier, &self.config, &mut track, det, 0.0, 0.0);
        debug!(track_id = id, frontal = track.measurement.frontal, "Created track");
        self.tracks.push(track);
    }

    fn apply_match(&mut self, index: usize, det: &Detection, dt: f32) {
        let track = &mut self.tracks[index];
        // Filters see the real gap since the last match; dwell stays frozen across it
        let since_seen = (self.clock - track.last_seen) as f32;
        track.last_seen = self.clock;
        let was_looked = track.looked;
        observe(&self.classifier, &self.config, track, det, since_seen, dt);
        if track.looked != was_looked {
            debug!(track_id = track.id, looked = track.looked, "Track look state changed");
        }
    }
}

/// Smooth a matched detection into a track and advance its dwell counters.
fn observe(
    classifier: &FrontalClassifier,
    config: &TrackerConfig,
    track: &mut Track,
    det: &Detection,
    filter_dt: f32,
    dt: f32,
) {
    let f = &mut track.filters;
    let center = f.center.filter(det.rect.center(), filter_dt);
    let size = f.size.filter(Point2::new(det.rect.width, det.rect.height), filter_dt);
    track.rect = Rect::from_center(center.x, center.y, size.x.max(0.0), size.y.max(0.0));

    let right_eye = f.right_eye.filter(det.landmarks.right_eye(), filter_dt);
    let left_eye = f.left_eye.filter(det.landmarks.left_eye(), filter_dt);
    let nose = f.nose.filter(det.landmarks.nose(), filter_dt);

    let thresholds = classifier.thresholds(track.looked);
    track.measurement = classifier.classify(right_eye, left_eye, nose, track.rect.width, thresholds);

    if track.measurement.frontal {
        track.look_hold += dt;
        track.not_hold = 0.0;
        if !track.looked && track.look_hold >= config.look_dwell_sec {
            track.looked = true;
        }
    } else {
        track.not_hold += dt;
        track.look_hold = 0.0;
        if track.looked && track.not_hold >= config.look_release_sec {
            track.looked = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 30.0;

    fn tracker() -> Tracker {
        Tracker::new(
            TrackerConfig::default(),
            FrontalConfig::default(),
            SmoothingConfig::default(),
        )
    }

    fn face(x: f32, y: f32) -> Detection {
        Detection::frontal(Rect::new(x, y, 100.0, 100.0), 0.9)
    }

    /// Same box with the nose pushed sideways (turned head).
    fn turned(x: f32, y: f32) -> Detection {
        let mut det = face(x, y);
        det.landmarks.0[2].x += 40.0;
        det
    }

    #[test]
    fn test_tracker_new_detections() {
        let mut tracker = tracker();
        let tracks = tracker.update(DT, &[face(100.0, 100.0), face(400.0, 100.0)]);
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].id, 0);
        assert_eq!(tracks[1].id, 1);
        // Fresh filters pass the first sample through
        assert_eq!(tracks[0].rect, Rect::new(100.0, 100.0, 100.0, 100.0));
        assert!(!tracks[0].looked);
    }

    #[test]
    fn test_tracker_matching() {
        let mut tracker = tracker();
        let first = tracker.update(DT, &[face(100.0, 100.0)]);
        let second = tracker.update(DT, &[face(105.0, 103.0)]);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].id, second[0].id);
    }

    #[test]
    fn test_global_greedy_prefers_best_overlap() {
        let mut tracker = tracker();
        tracker.update(DT, &[face(100.0, 100.0), face(160.0, 100.0)]);
        // Each detection overlaps both tracks; the best pairs must win
        let tracks = tracker.update(DT, &[face(165.0, 100.0), face(95.0, 100.0)]);
        assert_eq!(tracks.len(), 2);
        assert!(tracks[0].rect.x < 101.0);
        assert!(tracks[1].rect.x > 159.0);
    }

    #[test]
    fn test_eviction_after_timeout() {
        let mut tracker = tracker();
        tracker.update(DT, &[face(100.0, 100.0)]);

        // 0.4 s unseen: still alive
        for _ in 0..12 {
            assert_eq!(tracker.update(DT, &[]).len(), 1);
        }
        // Past 0.5 s: gone
        for _ in 0..4 {
            tracker.update(DT, &[]);
        }
        assert!(tracker.update(DT, &[]).is_empty());
    }

    #[test]
    fn test_reacquire_gets_new_identity_and_fresh_filters() {
        let mut tracker = tracker();
        tracker.update(DT, &[face(100.0, 100.0)]);
        tracker.update(1.0, &[]);
        assert!(tracker.is_empty());

        let tracks = tracker.update(DT, &[face(300.0, 200.0)]);
        assert_eq!(tracks[0].id, 1);
        assert_eq!(tracks[0].rect, Rect::new(300.0, 200.0, 100.0, 100.0));
    }

    #[test]
    fn test_looked_after_dwell() {
        let mut tracker = tracker();
        tracker.update(DT, &[face(100.0, 100.0)]);
        let mut looked_at = None;
        for frame in 1..=20 {
            let tracks = tracker.update(DT, &[face(100.0, 100.0)]);
            if tracks[0].looked && looked_at.is_none() {
                looked_at = Some(frame);
            }
        }
        // 0.35 s at 30 fps is 10.5 frames
        assert_eq!(looked_at, Some(11));
    }

    #[test]
    fn test_flicker_never_toggles_looked() {
        let mut tracker = tracker();
        for i in 0..90 {
            let det = if i % 4 < 2 {
                face(100.0, 100.0)
            } else {
                turned(100.0, 100.0)
            };
            let tracks = tracker.update(DT, &[det]);
            assert!(!tracks[0].looked, "toggled at frame {}", i);
        }
    }

    #[test]
    fn test_looked_survives_brief_turn() {
        let mut tracker = tracker();
        for _ in 0..20 {
            tracker.update(DT, &[face(100.0, 100.0)]);
        }
        assert!(tracker.snapshots()[0].looked);

        for _ in 0..5 {
            tracker.update(DT, &[turned(100.0, 100.0)]);
        }
        assert!(tracker.snapshots()[0].looked);

        for _ in 0..10 {
            tracker.update(DT, &[turned(100.0, 100.0)]);
        }
        assert!(!tracker.snapshots()[0].looked);
    }

    #[test]
    fn test_capacity_and_min_size() {
        let config = TrackerConfig {
            max_tracks: 2,
            ..Default::default()
        };
        let mut tracker = Tracker::new(config, FrontalConfig::default(), SmoothingConfig::default());
        let tiny = Detection::frontal(Rect::new(0.0, 0.0, 10.0, 10.0), 0.9);
        let tracks = tracker.update(
            DT,
            &[tiny, face(100.0, 100.0), face(300.0, 100.0), face(500.0, 100.0)],
        );
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].rect.x, 100.0);
    }

    #[test]
    fn test_unmatched_track_keeps_looked() {
        let mut tracker = tracker();
        for _ in 0..20 {
            tracker.update(DT, &[face(100.0, 100.0)]);
        }
        let tracks = tracker.update(0.3, &[]);
        assert!(tracks[0].looked);
        assert!((tracks[0].seconds_since_seen - 0.3).abs() < 1e-4);
    }

    #[test]
    fn test_rematch_filters_use_time_since_seen() {
        let smoothing = SmoothingConfig {
            beta: 0.0,
            ..Default::default()
        };
        let new = || Tracker::new(TrackerConfig::default(), FrontalConfig::default(), smoothing);

        let mut steady = new();
        steady.update(DT, &[face(100.0, 100.0)]);
        let steady = steady.update(DT, &[face(120.0, 100.0)]);

        let mut gapped = new();
        gapped.update(DT, &[face(100.0, 100.0)]);
        for _ in 0..9 {
            gapped.update(DT, &[]);
        }
        let gapped = gapped.update(DT, &[face(120.0, 100.0)]);

        // A longer interval lets the filter move further toward the new sample
        assert_eq!(steady[0].id, gapped[0].id);
        assert!(gapped[0].rect.cx() > steady[0].rect.cx() + 5.0);
        assert!(gapped[0].rect.cx() < 170.0);
    }
}
