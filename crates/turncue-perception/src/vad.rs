//! RMS voice activity detection with an adaptive noise floor.

use tracing::{debug, trace};
use turncue_models::VadState;

use crate::config::VadConfig;

/// Level reported for digital silence.
const MIN_RMS: f32 = 1e-6;

/// Energy-based VAD.
///
/// Speech starts when the frame level rises `speech_rise_db` above the
/// noise floor and is sustained while it stays `speech_hold_db` above it,
/// plus a hangover. The noise floor only learns from non-speech frames.
pub struct VoiceActivityDetector {
    config: VadConfig,
    noise_floor_db: f32,
    level_db: f32,
    is_speech: bool,
    hangover_left_ms: f32,
    silence_ms: f32,
    available: bool,
}

impl VoiceActivityDetector {
    pub fn new(config: VadConfig) -> Self {
        Self {
            noise_floor_db: config.initial_noise_floor_db,
            level_db: config.initial_noise_floor_db,
            config,
            is_speech: false,
            hangover_left_ms: 0.0,
            silence_ms: 0.0,
            available: true,
        }
    }

    /// Process one PCM frame of samples in [-1, 1].
    pub fn process_frame(&mut self, samples: &[f32]) -> VadState {
        let frame_ms = samples.len() as f32 * 1000.0 / self.config.sample_rate as f32;
        self.process_level(frame_level_db(samples), frame_ms)
    }

    /// Process a frame already reduced to its level in dBFS.
    pub fn process_level(&mut self, level_db: f32, frame_ms: f32) -> VadState {
        let level_db = if level_db.is_finite() {
            level_db
        } else {
            20.0 * MIN_RMS.log10()
        };
        let frame_ms = frame_ms.max(0.0);
        self.available = true;
        self.level_db = level_db;

        let margin = level_db - self.noise_floor_db;
        if self.is_speech {
            if margin >= self.config.speech_hold_db {
                self.hangover_left_ms = self.config.hangover_ms;
            } else {
                self.hangover_left_ms -= frame_ms;
                if self.hangover_left_ms <= 0.0 {
                    self.is_speech = false;
                    self.hangover_left_ms = 0.0;
                    self.silence_ms = 0.0;
                    debug!(level_db, noise_floor_db = self.noise_floor_db, "Speech ended");
                }
            }
        } else if margin >= self.config.speech_rise_db {
            self.is_speech = true;
            self.hangover_left_ms = self.config.hangover_ms;
            self.silence_ms = 0.0;
            debug!(level_db, noise_floor_db = self.noise_floor_db, "Speech started");
        } else {
            let target = level_db.min(self.config.noise_floor_cap_db);
            self.noise_floor_db += self.config.noise_floor_ema * (target - self.noise_floor_db);
            self.silence_ms += frame_ms;
        }

        trace!(
            level_db,
            noise_floor_db = self.noise_floor_db,
            is_speech = self.is_speech,
            silence_ms = self.silence_ms,
            "VAD frame"
        );
        self.state()
    }

    /// Report that no microphone frame arrived for this tick.
    ///
    /// Speech becomes indeterminate: not speech, and the silence timer is
    /// cleared so a stale gap is never reported once audio resumes.
    pub fn mark_unavailable(&mut self) -> VadState {
        if self.available {
            debug!("Microphone unavailable");
        }
        self.available = false;
        self.is_speech = false;
        self.hangover_left_ms = 0.0;
        self.silence_ms = 0.0;
        self.state()
    }

    /// Current state without processing audio.
    pub fn state(&self) -> VadState {
        if !self.available {
            return VadState::unavailable(self.noise_floor_db);
        }
        VadState {
            is_speech: self.is_speech,
            silence_ms: self.silence_ms,
            level_db: self.level_db,
            noise_floor_db: self.noise_floor_db,
            available: true,
        }
    }
}

/// `20·log10(rms)` of a frame, floored at -120 dBFS.
pub fn frame_level_db(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 20.0 * MIN_RMS.log10();
    }
    let mean_square =
        samples.iter().map(|s| (*s as f64) * (*s as f64)).sum::<f64>() / samples.len() as f64;
    let rms = (mean_square.sqrt() as f32).max(MIN_RMS);
    20.0 * rms.log10()
}
