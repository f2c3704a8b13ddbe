//! Voice activity snapshot.

use serde::{Deserialize, Serialize};

/// Per-frame voice activity state.
///
/// `noise_floor_db` only moves while `is_speech` is false.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VadState {
    pub is_speech: bool,
    /// Continuous time outside speech, reset on speech entry
    pub silence_ms: f32,
    /// Frame level in dBFS
    pub level_db: f32,
    /// Adaptive noise floor in dBFS
    pub noise_floor_db: f32,
    /// False when the microphone produced no frame (speech indeterminate)
    pub available: bool,
}

impl VadState {
    /// Level above the noise floor in dB.
    #[inline]
    pub fn margin_db(&self) -> f32 {
        self.level_db - self.noise_floor_db
    }

    /// Snapshot used before the first frame or when no microphone exists.
    pub fn unavailable(noise_floor_db: f32) -> Self {
        Self {
            is_speech: false,
            silence_ms: 0.0,
            level_db: noise_floor_db,
            noise_floor_db,
            available: false,
        }
    }
}
