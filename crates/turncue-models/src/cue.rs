//! Cue events and output modalities.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of cue emitted by the turn-taking orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CueKind {
    /// The group is addressing the wearer but the floor is taken.
    Hold,
    /// The floor is free: the wearer may speak now.
    Speak,
}

impl CueKind {
    /// Returns the cue name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            CueKind::Hold => "hold",
            CueKind::Speak => "speak",
        }
    }
}

impl fmt::Display for CueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cue decision ready for dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CueEvent {
    pub kind: CueKind,
    /// Short stable reason code
    pub reason: String,
    /// Direction of the addressing group at fire time (-1..1)
    pub direction_hint: f32,
    /// Orchestrator clock in seconds when the cue fired
    pub at_sec: f64,
}

impl CueEvent {
    /// Create a new cue event. The direction hint is clamped to [-1, 1].
    pub fn new(kind: CueKind, reason: impl Into<String>, direction_hint: f32, at_sec: f64) -> Self {
        Self {
            kind,
            reason: reason.into(),
            direction_hint: direction_hint.clamp(-1.0, 1.0),
            at_sec,
        }
    }
}

/// Output channel modality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Modality {
    Visual,
    Haptic,
    Audio,
}

/// Which modalities a dispatch may use.
///
/// Passed by value on every dispatch call; there is no global toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalityToggles {
    pub visual: bool,
    pub haptic: bool,
    pub audio: bool,
}

impl Default for ModalityToggles {
    fn default() -> Self {
        Self {
            visual: true,
            haptic: true,
            audio: false,
        }
    }
}

impl ModalityToggles {
    /// Whether a modality is enabled.
    pub fn allows(&self, modality: Modality) -> bool {
        match modality {
            Modality::Visual => self.visual,
            Modality::Haptic => self.haptic,
            Modality::Audio => self.audio,
        }
    }
}
