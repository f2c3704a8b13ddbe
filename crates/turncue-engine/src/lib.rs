//! Turn-taking engine for the turncue headset loop.
//!
//! This crate provides:
//! - The HOLD / SPEAK turn-taking state machine
//! - Cue fan-out to modality channels
//! - The per-tick [`Pipeline`] wiring perception to cues
//! - Layered configuration, an optional JSON-lines event log and metrics

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod event_log;
pub mod metrics;
pub mod orchestrator;
pub mod pipeline;
pub mod replay;

pub use config::{ReplayConfig, TurnTakingConfig, TurncueConfig};
pub use dispatcher::{CueChannel, CueDispatcher, DispatchReport, RecordingChannel, TracingChannel};
pub use error::{DispatchError, EngineError, EngineResult};
pub use event_log::EventLog;
pub use orchestrator::{reasons, TurnTakingOrchestrator};
pub use pipeline::{AudioInput, FrameInput, Pipeline, TickInput, TickOutput};
pub use replay::ReplayTick;
