//! Group-level attention snapshot.

use serde::{Deserialize, Serialize};

/// Derived each tick by the attention aggregator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupAttentionState {
    /// Fraction of tracked faces that are looking (0.0-1.0)
    pub attention_score: f32,
    /// Number of tracked faces
    pub faces_count: usize,
    /// Number of tracked faces currently "looked"
    pub looking_count: usize,
    /// Stable group-addressed flag after dwell hysteresis
    pub addressed: bool,
    /// Seconds since `addressed` became true (0 while not addressed)
    pub seconds_since_addressed: f32,
    /// Smoothed horizontal direction hint (-1 = left, +1 = right)
    pub direction_lr: f32,
}
