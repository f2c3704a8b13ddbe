//! Group attention: from per-track "looked" flags to a stable "addressed"
//! signal and a left/right direction hint.

use tracing::{debug, trace};
use turncue_models::{GroupAttentionState, TrackSnapshot};

use crate::config::AttentionConfig;
use crate::metrics;

/// Aggregates track snapshots into a [`GroupAttentionState`] each tick.
///
/// `addressed` only turns on after the group has been a looking majority
/// for `enter_stable_sec` without interruption, and only turns off after
/// `exit_stable_sec` of continuous non-majority.
pub struct AttentionAggregator {
    config: AttentionConfig,
    addressed: bool,
    enter_timer: f32,
    exit_timer: f32,
    addressed_for: f32,
    direction: f32,
    /// Last non-empty (faces, looking) counts
    last_counts: Option<(usize, usize)>,
    /// Time since the track list became empty
    empty_for: f32,
}

impl AttentionAggregator {
    pub fn new(config: AttentionConfig) -> Self {
        Self {
            config,
            addressed: false,
            enter_timer: 0.0,
            exit_timer: 0.0,
            addressed_for: 0.0,
            direction: 0.0,
            last_counts: None,
            empty_for: 0.0,
        }
    }

    /// Fold one tick of track snapshots into the group state.
    pub fn update(&mut self, dt: f32, tracks: &[TrackSnapshot]) -> GroupAttentionState {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        let (faces, looking) = self.counts(dt, tracks);

        let attention_score = if faces == 0 {
            0.0
        } else {
            looking as f32 / faces as f32
        };
        let candidate = faces > 0 && attention_score >= self.config.group_min_proportion;

        if candidate {
            self.enter_timer += dt;
            self.exit_timer = 0.0;
        } else {
            self.exit_timer += dt;
            self.enter_timer = 0.0;
        }

        if self.addressed {
            if !candidate && self.exit_timer >= self.config.exit_stable_sec {
                self.addressed = false;
                self.addressed_for = 0.0;
                debug!(attention_score, faces, "Group no longer addressing wearer");
            } else {
                self.addressed_for += dt;
            }
        } else if candidate && self.enter_timer >= self.config.enter_stable_sec {
            self.addressed = true;
            self.addressed_for = 0.0;
            debug!(attention_score, faces, looking, "Group addressing wearer");
        }

        if let Some(target) = self.direction_target(tracks) {
            self.direction += self.config.dir_lerp * (target - self.direction);
            self.direction = self.direction.clamp(-1.0, 1.0);
        }

        metrics::set_attention_score(attention_score);
        trace!(
            attention_score,
            faces,
            looking,
            enter = self.enter_timer,
            exit = self.exit_timer,
            "Attention tick"
        );

        GroupAttentionState {
            attention_score,
            faces_count: faces,
            looking_count: looking,
            addressed: self.addressed,
            seconds_since_addressed: if self.addressed { self.addressed_for } else { 0.0 },
            direction_lr: self.direction,
        }
    }

    /// Face counts for this tick, holding the last non-empty counts through
    /// a short dropout.
    fn counts(&mut self, dt: f32, tracks: &[TrackSnapshot]) -> (usize, usize) {
        if !tracks.is_empty() {
            self.empty_for = 0.0;
            let counts = (tracks.len(), tracks.iter().filter(|t| t.looked).count());
            self.last_counts = Some(counts);
            return counts;
        }

        self.empty_for += dt;
        match self.last_counts {
            Some(counts) if self.empty_for <= self.config.dropout_grace_sec => counts,
            _ => {
                self.last_counts = None;
                (0, 0)
            }
        }
    }

    /// Width-weighted horizontal centroid of looked tracks (all tracks if
    /// none is looked) mapped to [-1, 1]. `None` without tracks.
    fn direction_target(&self, tracks: &[TrackSnapshot]) -> Option<f32> {
        let looked: Vec<&TrackSnapshot> = tracks.iter().filter(|t| t.looked).collect();
        let chosen: Vec<&TrackSnapshot> = if looked.is_empty() {
            tracks.iter().collect()
        } else {
            looked
        };

        let total_width: f32 = chosen.iter().map(|t| t.rect.width.max(0.0)).sum();
        if chosen.is_empty() || total_width <= 0.0 {
            return None;
        }

        let centroid =
            chosen.iter().map(|t| t.rect.cx() * t.rect.width.max(0.0)).sum::<f32>() / total_width;
        Some(((centroid / self.config.frame_width) * 2.0 - 1.0).clamp(-1.0, 1.0))
    }

    pub fn is_addressed(&self) -> bool {
        self.addressed
    }
}
