#![deny(unreachable_patterns)]
//! Perception stages of the turncue control loop.
//!
//! This crate provides:
//! - Prior (anchor) generation and detector output decoding with NMS
//! - A pluggable inference boundary and frame preprocessing
//! - One-Euro smoothing for per-face point streams
//! - Geometric frontal classification with enter/exit thresholds
//! - IoU tracking with dwell hysteresis on the "looked" state
//! - Group attention aggregation with a stable "addressed" flag
//! - RMS voice activity detection with an adaptive noise floor
//!
//! Every stage is a plain `&mut self` state machine driven by an explicit
//! `dt`; nothing here spawns threads or blocks.

pub mod attention;
pub mod config;
pub mod detection;
pub mod error;
pub mod frontal;
pub mod metrics;
pub mod smoothing;
pub mod tracker;
pub mod vad;

pub use attention::AttentionAggregator;
pub use config::{
    AttentionConfig, ChannelOrder, DecoderConfig, FrontalConfig, FrontalThresholds, OutputLayout,
    PreprocessConfig, PriorLevel, ScoreActivation, SmoothingConfig, TrackerConfig, VadConfig,
};
pub use detection::{
    decode, non_maximum_suppression, DetectorDecoder, FaceDetector, Frame, InferenceBackend,
    Preprocessor, Prior, PriorBox, VALUES_PER_ANCHOR,
};
pub use error::{VisionError, VisionResult};
pub use frontal::{FrontalClassifier, FrontalMeasurement};
pub use smoothing::{OneEuroFilter, OneEuroFilter2};
pub use tracker::Tracker;
pub use vad::{frame_level_db, VoiceActivityDetector};

#[cfg(feature = "onnx")]
pub use detection::OrtBackend;
