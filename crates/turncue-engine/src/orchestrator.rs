//! Turn-taking state machine.
//!
//! Fuses the group attention state with voice activity into HOLD and SPEAK
//! cues:
//!
//! ```text
//!   Idle --addressed--> AddressedHold --gap--> Cooldown --not addressed--> Idle
//!     \                      |
//!      \--addressed + gap----+--> Cooldown
//!                            \--not addressed--> Idle
//! ```
//!
//! A new cycle needs `rearm_seconds` since the last address ended. The quiet
//! timer gating SPEAK runs in every state and restarts on speech or loudness.

use tracing::{debug, info};
use turncue_models::{CueEvent, CueKind, GroupAttentionState, TurnState, VadState};

use crate::config::TurnTakingConfig;
use crate::metrics;

/// Stable cue reasons.
pub mod reasons {
    pub const ADDRESSED_GAP_READY: &str = "addressed_gap_ready";
    pub const ADDRESSED_WHILE_SPEECH: &str = "addressed_while_speech";
    pub const ADDRESSED_NOT_QUIET_YET: &str = "addressed_not_quiet_yet";
    pub const GAP_AFTER_HOLD: &str = "gap_after_hold";
}

/// Turn-taking orchestrator.
pub struct TurnTakingOrchestrator {
    config: TurnTakingConfig,
    state: TurnState,
    /// Seconds since construction
    clock: f64,
    prev_addressed: bool,
    /// Rising edge seen while re-arm was still pending
    edge_latched: bool,
    last_exit_at: Option<f64>,
    last_speak_at: Option<f64>,
    last_hold_at: Option<f64>,
    /// Continuous quiet time, counted across every state
    quiet_for: f32,
}

impl TurnTakingOrchestrator {
    pub fn new(config: TurnTakingConfig) -> Self {
        Self {
            config,
            state: TurnState::Idle,
            clock: 0.0,
            prev_addressed: false,
            edge_latched: false,
            last_exit_at: None,
            last_speak_at: None,
            last_hold_at: None,
            quiet_for: 0.0,
        }
    }

    /// Advance by `dt` seconds with this tick's attention and VAD samples.
    ///
    /// Returns at most one cue.
    pub fn tick(
        &mut self,
        dt: f32,
        attention: &GroupAttentionState,
        vad: &VadState,
    ) -> Option<CueEvent> {
        let dt = if dt.is_finite() && dt > 0.0 { dt } else { 0.0 };
        self.clock += dt as f64;

        let addressed = attention.addressed;
        let rising = addressed && !self.prev_addressed;
        self.prev_addressed = addressed;

        // Quiet leading up to the address counts toward the invite
        if self.is_quiet(vad) {
            self.quiet_for += dt;
        } else {
            self.quiet_for = 0.0;
        }

        match self.state {
            TurnState::Idle => {
                if rising {
                    self.edge_latched = true;
                }
                if !addressed {
                    self.edge_latched = false;
                }
                if self.edge_latched && self.rearm_elapsed() {
                    self.edge_latched = false;
                    return self.enter_cycle(attention, vad);
                }
                None
            }
            TurnState::AddressedHold => {
                if !addressed {
                    self.end_address();
                    return None;
                }

                if self.can_invite(vad) {
                    let cue = self.fire_speak(reasons::GAP_AFTER_HOLD, attention);
                    self.transition(TurnState::Cooldown);
                    return Some(cue);
                }
                None
            }
            TurnState::Cooldown => {
                if !addressed {
                    self.end_address();
                }
                None
            }
        }
    }

    /// Start a cycle on an (accepted) addressed rising edge.
    fn enter_cycle(&mut self, attention: &GroupAttentionState, vad: &VadState) -> Option<CueEvent> {
        if self.can_invite(vad) {
            let cue = self.fire_speak(reasons::ADDRESSED_GAP_READY, attention);
            self.transition(TurnState::Cooldown);
            return Some(cue);
        }

        let reason = if vad.is_speech {
            reasons::ADDRESSED_WHILE_SPEECH
        } else {
            reasons::ADDRESSED_NOT_QUIET_YET
        };
        let cue = self.fire_hold(reason, attention);
        self.transition(TurnState::AddressedHold);
        cue
    }

    /// Gap-ready, quiet long enough and SPEAK cooldown elapsed.
    fn can_invite(&self, vad: &VadState) -> bool {
        self.gap_ready(vad)
            && self.quiet_for >= self.config.min_quiet_to_invite_sec
            && elapsed_since(self.last_speak_at, self.clock, self.config.speak_cooldown_sec)
    }

    fn gap_ready(&self, vad: &VadState) -> bool {
        vad.available && !vad.is_speech && vad.silence_ms >= self.config.min_silence_ms
    }

    fn is_quiet(&self, vad: &VadState) -> bool {
        vad.available && !vad.is_speech && vad.margin_db() < self.config.quiet_margin_db
    }

    fn rearm_elapsed(&self) -> bool {
        elapsed_since(self.last_exit_at, self.clock, self.config.rearm_seconds)
    }

    fn fire_speak(&mut self, reason: &str, attention: &GroupAttentionState) -> CueEvent {
        self.last_speak_at = Some(self.clock);
        metrics::record_cue(CueKind::Speak);
        info!(reason, direction = attention.direction_lr, at = self.clock, "SPEAK cue");
        CueEvent::new(CueKind::Speak, reason, attention.direction_lr, self.clock)
    }

    fn fire_hold(&mut self, reason: &str, attention: &GroupAttentionState) -> Option<CueEvent> {
        if !elapsed_since(self.last_hold_at, self.clock, self.config.hold_cooldown_sec) {
            metrics::record_cue_suppressed(CueKind::Hold);
            debug!(reason, "HOLD suppressed by cooldown");
            return None;
        }
        self.last_hold_at = Some(self.clock);
        metrics::record_cue(CueKind::Hold);
        info!(reason, direction = attention.direction_lr, at = self.clock, "HOLD cue");
        Some(CueEvent::new(CueKind::Hold, reason, attention.direction_lr, self.clock))
    }

    fn end_address(&mut self) {
        self.last_exit_at = Some(self.clock);
        self.transition(TurnState::Idle);
    }

    fn transition(&mut self, to: TurnState) {
        if self.state != to {
            debug!(from = %self.state, to = %to, at = self.clock, "Turn state transition");
            metrics::record_transition(self.state, to);
            self.state = to;
        }
    }

    pub fn state(&self) -> TurnState {
        self.state
    }

    /// Seconds since construction.
    pub fn clock(&self) -> f64 {
        self.clock
    }
}

fn elapsed_since(last: Option<f64>, now: f64, window: f32) -> bool {
    last.map_or(true, |t| now - t >= window as f64)
}
