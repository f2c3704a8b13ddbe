//! Configuration for the perception stages.
//!
//! Every struct carries its documented defaults in `Default` and is
//! `#[serde(default)]`, so a partial TOML section only overrides the keys
//! it names.

use serde::{Deserialize, Serialize};
use turncue_models::{ConfigError, ConfigResult};

// === Detector ===

/// Memory layout of the detector output buffer.
///
/// Declared by configuration; the decoder never guesses it from the data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OutputLayout {
    /// `[anchor][15]`: all values of one anchor are contiguous.
    #[default]
    AnchorMajor,
    /// `[15][anchor]`: one channel for every anchor, then the next channel.
    ChannelMajor,
}

/// How the raw confidence channel maps to a probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScoreActivation {
    /// The model already outputs a probability.
    #[default]
    Identity,
    /// The model outputs a logit.
    Sigmoid,
}

/// Channel order of the network input tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChannelOrder {
    Rgb,
    #[default]
    Bgr,
}

/// One feature-map level of the prior generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriorLevel {
    /// Feature-map stride in input pixels
    pub step: u32,
    /// Anchor sizes in input pixels, one prior per size per cell
    pub min_sizes: Vec<f32>,
}

impl PriorLevel {
    pub fn new(step: u32, min_sizes: &[f32]) -> Self {
        Self {
            step,
            min_sizes: min_sizes.to_vec(),
        }
    }
}

/// Network input preprocessing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreprocessConfig {
    pub channel_order: ChannelOrder,
    /// Per-channel mean subtracted before scaling (in tensor channel order)
    pub mean: [f32; 3],
    /// Multiplier applied after mean subtraction
    pub scale: f32,
}

impl Default for PreprocessConfig {
    fn default() -> Self {
        // libfacedetection-style models take raw 0-255 BGR
        Self {
            channel_order: ChannelOrder::Bgr,
            mean: [0.0, 0.0, 0.0],
            scale: 1.0,
        }
    }
}

/// Configuration for prior generation and output decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecoderConfig {
    /// Network input width in pixels (default: 320)
    pub input_width: u32,
    /// Network input height in pixels (default: 240)
    pub input_height: u32,
    /// Prior levels as (step, min sizes) pairs
    pub prior_levels: Vec<PriorLevel>,
    /// Variance applied to centre offsets and landmarks (default: 0.1)
    pub center_variance: f32,
    /// Variance applied to log-size deltas (default: 0.2)
    pub size_variance: f32,
    /// Name of the model output tensor (default: "output")
    pub output_name: String,
    /// Output buffer layout
    pub layout: OutputLayout,
    /// Confidence activation
    pub score_activation: ScoreActivation,
    /// Minimum confidence to keep an anchor (default: 0.6)
    pub conf_threshold: f32,
    /// NMS overlap threshold (default: 0.3)
    pub iou_threshold: f32,
    /// Maximum faces returned per frame (default: 8)
    pub max_detections: usize,
    /// Minimum face side in frame pixels (default: 24)
    pub min_face_side_px: f32,
    /// Input tensor preparation
    pub preprocess: PreprocessConfig,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            input_width: 320,
            input_height: 240,
            prior_levels: vec![
                PriorLevel::new(8, &[10.0, 16.0, 24.0]),
                PriorLevel::new(16, &[32.0, 48.0]),
                PriorLevel::new(32, &[64.0, 96.0]),
                PriorLevel::new(64, &[128.0, 192.0, 256.0]),
            ],
            center_variance: 0.1,
            size_variance: 0.2,
            output_name: "output".to_string(),
            layout: OutputLayout::AnchorMajor,
            score_activation: ScoreActivation::Identity,
            conf_threshold: 0.6,
            iou_threshold: 0.3,
            max_detections: 8,
            min_face_side_px: 24.0,
            preprocess: PreprocessConfig::default(),
        }
    }
}

impl DecoderConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        ConfigError::check_positive("decoder.input_width", self.input_width as f64)?;
        ConfigError::check_positive("decoder.input_height", self.input_height as f64)?;
        if self.prior_levels.is_empty() {
            return Err(ConfigError::invalid("decoder.prior_levels must not be empty"));
        }
        for level in &self.prior_levels {
            ConfigError::check_positive("decoder.prior_levels.step", level.step as f64)?;
            if level.min_sizes.is_empty() {
                return Err(ConfigError::invalid(format!(
                    "decoder.prior_levels step {} has no min_sizes",
                    level.step
                )));
            }
            for size in &level.min_sizes {
                ConfigError::check_positive("decoder.prior_levels.min_sizes", *size as f64)?;
            }
        }
        if self.output_name.trim().is_empty() {
            return Err(ConfigError::invalid("decoder.output_name must not be empty"));
        }
        ConfigError::check_positive("decoder.center_variance", self.center_variance as f64)?;
        ConfigError::check_positive("decoder.size_variance", self.size_variance as f64)?;
        ConfigError::check_range("decoder.conf_threshold", self.conf_threshold as f64, 0.0, 1.0)?;
        ConfigError::check_range("decoder.iou_threshold", self.iou_threshold as f64, 0.0, 1.0)?;
        ConfigError::check_positive("decoder.max_detections", self.max_detections as f64)?;
        ConfigError::check_range(
            "decoder.min_face_side_px",
            self.min_face_side_px as f64,
            0.0,
            f64::MAX,
        )?;
        ConfigError::check_positive("decoder.preprocess.scale", self.preprocess.scale as f64)
    }
}

// === Smoothing ===

/// One-Euro filter parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmoothingConfig {
    /// Cutoff frequency at rest in Hz (default: 1.0)
    pub min_cutoff: f32,
    /// Speed coefficient (default: 0.007)
    pub beta: f32,
    /// Cutoff for the derivative estimate in Hz (default: 1.0)
    pub derivative_cutoff: f32,
}

impl Default for SmoothingConfig {
    fn default() -> Self {
        Self {
            min_cutoff: 1.0,
            beta: 0.007,
            derivative_cutoff: 1.0,
        }
    }
}

impl SmoothingConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        ConfigError::check_positive("smoothing.min_cutoff", self.min_cutoff as f64)?;
        ConfigError::check_range("smoothing.beta", self.beta as f64, 0.0, f64::MAX)?;
        ConfigError::check_positive("smoothing.derivative_cutoff", self.derivative_cutoff as f64)
    }
}

// === Frontal classifier ===

/// One side of the geometric hysteresis pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrontalThresholds {
    /// Maximum eye-line roll in degrees
    pub max_roll_deg: f32,
    /// Maximum normalized nose offset from the eye midpoint
    pub max_nose_asym: f32,
}

/// Frontal classifier configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontalConfig {
    /// Thresholds used while a face is not looked (stricter)
    pub enter: FrontalThresholds,
    /// Thresholds used while a face is looked (looser)
    pub exit: FrontalThresholds,
    /// Minimum eye distance as a fraction of face width (default: 0.2)
    pub min_inter_frac: f32,
    /// Minimum eye distance in pixels (default: 6)
    pub min_inter_abs_px: f32,
}

impl Default for FrontalConfig {
    fn default() -> Self {
        Self {
            enter: FrontalThresholds {
                max_roll_deg: 20.0,
                max_nose_asym: 0.18,
            },
            exit: FrontalThresholds {
                max_roll_deg: 28.0,
                max_nose_asym: 0.26,
            },
            min_inter_frac: 0.2,
            min_inter_abs_px: 6.0,
        }
    }
}

impl FrontalConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        for (field, value) in [
            ("frontal.enter.max_roll_deg", self.enter.max_roll_deg),
            ("frontal.exit.max_roll_deg", self.exit.max_roll_deg),
        ] {
            ConfigError::check_range(field, value as f64, 0.0, 90.0)?;
        }
        for (field, value) in [
            ("frontal.enter.max_nose_asym", self.enter.max_nose_asym),
            ("frontal.exit.max_nose_asym", self.exit.max_nose_asym),
        ] {
            ConfigError::check_positive(field, value as f64)?;
        }
        if self.exit.max_roll_deg < self.enter.max_roll_deg {
            return Err(ConfigError::InvertedHysteresis {
                tighter: "frontal.enter.max_roll_deg",
                looser: "frontal.exit.max_roll_deg",
            });
        }
        if self.exit.max_nose_asym < self.enter.max_nose_asym {
            return Err(ConfigError::InvertedHysteresis {
                tighter: "frontal.enter.max_nose_asym",
                looser: "frontal.exit.max_nose_asym",
            });
        }
        ConfigError::check_range("frontal.min_inter_frac", self.min_inter_frac as f64, 0.0, 1.0)?;
        ConfigError::check_range(
            "frontal.min_inter_abs_px",
            self.min_inter_abs_px as f64,
            0.0,
            f64::MAX,
        )
    }
}

// === Tracking ===

/// Tracker configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Minimum IoU to match a detection to a track (default: 0.3)
    pub match_iou: f32,
    /// Maximum simultaneous tracks (default: 8)
    pub max_tracks: usize,
    /// Seconds a track may go unseen before eviction (default: 0.5)
    pub track_timeout_sec: f32,
    /// Continuous frontal time before "looked" turns on (default: 0.35)
    pub look_dwell_sec: f32,
    /// Continuous non-frontal time before "looked" turns off (default: 0.35)
    pub look_release_sec: f32,
    /// Detections smaller than this are ignored (default: 24)
    pub min_track_side_px: f32,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            match_iou: 0.3,
            max_tracks: 8,
            track_timeout_sec: 0.5,
            look_dwell_sec: 0.35,
            look_release_sec: 0.35,
            min_track_side_px: 24.0,
        }
    }
}

impl TrackerConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        ConfigError::check_range("tracker.match_iou", self.match_iou as f64, 0.0, 1.0)?;
        ConfigError::check_positive("tracker.max_tracks", self.max_tracks as f64)?;
        ConfigError::check_positive("tracker.track_timeout_sec", self.track_timeout_sec as f64)?;
        ConfigError::check_range("tracker.look_dwell_sec", self.look_dwell_sec as f64, 0.0, 60.0)?;
        ConfigError::check_range(
            "tracker.look_release_sec",
            self.look_release_sec as f64,
            0.0,
            60.0,
        )?;
        ConfigError::check_range(
            "tracker.min_track_side_px",
            self.min_track_side_px as f64,
            0.0,
            f64::MAX,
        )
    }
}

// === Group attention ===

/// Group attention aggregator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttentionConfig {
    /// Fraction of looking faces that counts as addressed (default: 0.5)
    pub group_min_proportion: f32,
    /// Continuous candidate time before addressed turns on (default: 0.8)
    pub enter_stable_sec: f32,
    /// Continuous non-candidate time before addressed turns off (default: 0.6)
    pub exit_stable_sec: f32,
    /// Exponential smoothing factor for the direction hint (default: 0.2)
    pub dir_lerp: f32,
    /// How long the last face count is held after all tracks vanish (default: 0.25)
    pub dropout_grace_sec: f32,
    /// Camera frame width in pixels used to normalize direction (default: 640)
    pub frame_width: f32,
}

impl Default for AttentionConfig {
    fn default() -> Self {
        Self {
            group_min_proportion: 0.5,
            enter_stable_sec: 0.8,
            exit_stable_sec: 0.6,
            dir_lerp: 0.2,
            dropout_grace_sec: 0.25,
            frame_width: 640.0,
        }
    }
}

impl AttentionConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        ConfigError::check_range(
            "attention.group_min_proportion",
            self.group_min_proportion as f64,
            0.0,
            1.0,
        )?;
        ConfigError::check_range("attention.enter_stable_sec", self.enter_stable_sec as f64, 0.0, 60.0)?;
        ConfigError::check_range("attention.exit_stable_sec", self.exit_stable_sec as f64, 0.0, 60.0)?;
        ConfigError::check_range("attention.dir_lerp", self.dir_lerp as f64, 0.0, 1.0)?;
        ConfigError::check_range(
            "attention.dropout_grace_sec",
            self.dropout_grace_sec as f64,
            0.0,
            60.0,
        )?;
        ConfigError::check_positive("attention.frame_width", self.frame_width as f64)
    }
}

// === Voice activity ===

/// Voice activity detector configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VadConfig {
    /// PCM sample rate in Hz (default: 16000)
    pub sample_rate: u32,
    /// Noise floor before any audio is seen (default: -60 dBFS)
    pub initial_noise_floor_db: f32,
    /// Highest level the noise floor may learn from (default: -30 dBFS)
    pub noise_floor_cap_db: f32,
    /// Noise floor EMA factor per frame (default: 0.05)
    pub noise_floor_ema: f32,
    /// Margin above the floor that starts speech (default: 10 dB)
    pub speech_rise_db: f32,
    /// Margin above the floor that sustains speech (default: 6 dB)
    pub speech_hold_db: f32,
    /// Hangover after the last qualifying frame (default: 300 ms)
    pub hangover_ms: f32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            sample_rate: 16000,
            initial_noise_floor_db: -60.0,
            noise_floor_cap_db: -30.0,
            noise_floor_ema: 0.05,
            speech_rise_db: 10.0,
            speech_hold_db: 6.0,
            hangover_ms: 300.0,
        }
    }
}

impl VadConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        ConfigError::check_positive("vad.sample_rate", self.sample_rate as f64)?;
        ConfigError::check_range("vad.noise_floor_ema", self.noise_floor_ema as f64, 0.0, 1.0)?;
        ConfigError::check_positive("vad.speech_rise_db", self.speech_rise_db as f64)?;
        ConfigError::check_range("vad.speech_hold_db", self.speech_hold_db as f64, 0.0, f64::MAX)?;
        if self.speech_hold_db > self.speech_rise_db {
            return Err(ConfigError::InvertedHysteresis {
                tighter: "vad.speech_rise_db",
                looser: "vad.speech_hold_db",
            });
        }
        ConfigError::check_range("vad.hangover_ms", self.hangover_ms as f64, 0.0, 60_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(DecoderConfig::default().validate().is_ok());
        assert!(SmoothingConfig::default().validate().is_ok());
        assert!(FrontalConfig::default().validate().is_ok());
        assert!(TrackerConfig::default().validate().is_ok());
        assert!(AttentionConfig::default().validate().is_ok());
        assert!(VadConfig::default().validate().is_ok());
    }

    #[test]
    fn test_inverted_frontal_hysteresis_rejected() {
        let mut config = FrontalConfig::default();
        config.exit.max_roll_deg = 10.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvertedHysteresis { .. })
        ));
    }

    #[test]
    fn test_inverted_vad_hysteresis_rejected() {
        let config = VadConfig {
            speech_hold_db: 12.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: TrackerConfig = serde_json::from_str(r#"{"max_tracks": 3}"#).unwrap();
        assert_eq!(config.max_tracks, 3);
        assert_eq!(config.match_iou, TrackerConfig::default().match_iou);
    }

    #[test]
    fn test_layout_names() {
        let layout: OutputLayout = serde_json::from_str("\"channel_major\"").unwrap();
        assert_eq!(layout, OutputLayout::ChannelMajor);
    }

    #[test]
    fn test_output_tensor_name_is_configurable() {
        let config: DecoderConfig =
            serde_json::from_str(r#"{"output_name": "face_output", "layout": "channel_major"}"#)
                .unwrap();
        assert_eq!(config.output_name, "face_output");
        assert_eq!(config.layout, OutputLayout::ChannelMajor);
        assert_eq!(DecoderConfig::default().output_name, "output");

        let blank = DecoderConfig {
            output_name: " ".to_string(),
            ..Default::default()
        };
        assert!(blank.validate().is_err());
    }
}
