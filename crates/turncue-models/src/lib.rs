//! Shared data models for the turncue perception loop.
//!
//! This crate provides plain, Serde-serializable types for:
//! - Pixel-space geometry (points, rectangles, IoU)
//! - Face detections with five-point landmarks
//! - Per-tick state snapshots (tracks, group attention, voice activity)
//! - Turn-taking states and cue events
//! - Configuration errors shared by every component

pub mod attention;
pub mod config_error;
pub mod cue;
pub mod detection;
pub mod geometry;
pub mod track;
pub mod turn;
pub mod vad;

// Re-export common types
pub use attention::GroupAttentionState;
pub use config_error::{ConfigError, ConfigResult};
pub use cue::{CueEvent, CueKind, Modality, ModalityToggles};
pub use detection::{Detection, Landmark, Landmarks};
pub use geometry::{Point2, Rect};
pub use track::{TrackId, TrackSnapshot};
pub use turn::TurnState;
pub use vad::VadState;
