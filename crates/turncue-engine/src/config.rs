//! Engine configuration.
//!
//! Loaded in layers: built-in defaults, then an optional TOML file named by
//! `TURNCUE_CONFIG`, then `TURNCUE__SECTION__KEY` environment variables.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};
use turncue_models::{ConfigError, ConfigResult, ModalityToggles};
use turncue_perception::{
    AttentionConfig, DecoderConfig, FrontalConfig, SmoothingConfig, TrackerConfig, VadConfig,
};

use crate::error::EngineResult;

/// Environment variable naming the optional TOML config file.
pub const CONFIG_PATH_ENV: &str = "TURNCUE_CONFIG";

/// Turn-taking orchestrator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnTakingConfig {
    /// Silence needed before the floor counts as free (default: 550 ms)
    pub min_silence_ms: f32,
    /// Continuous quiet since address entry before inviting (default: 1.2 s)
    pub min_quiet_to_invite_sec: f32,
    /// Minimum time between SPEAK cues (default: 4.0 s)
    pub speak_cooldown_sec: f32,
    /// Minimum time between HOLD cues (default: 1.5 s)
    pub hold_cooldown_sec: f32,
    /// Delay after an address ends before a new cycle may start (default: 1.0 s)
    pub rearm_seconds: f32,
    /// Level above the noise floor that breaks quiet-since-entry (default: 6 dB)
    pub quiet_margin_db: f32,
}

impl Default for TurnTakingConfig {
    fn default() -> Self {
        Self {
            min_silence_ms: 550.0,
            min_quiet_to_invite_sec: 1.2,
            speak_cooldown_sec: 4.0,
            hold_cooldown_sec: 1.5,
            rearm_seconds: 1.0,
            quiet_margin_db: 6.0,
        }
    }
}

impl TurnTakingConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        ConfigError::check_range("turn_taking.min_silence_ms", self.min_silence_ms as f64, 0.0, 60_000.0)?;
        ConfigError::check_range(
            "turn_taking.min_quiet_to_invite_sec",
            self.min_quiet_to_invite_sec as f64,
            0.0,
            60.0,
        )?;
        ConfigError::check_range("turn_taking.speak_cooldown_sec", self.speak_cooldown_sec as f64, 0.0, 600.0)?;
        ConfigError::check_range("turn_taking.hold_cooldown_sec", self.hold_cooldown_sec as f64, 0.0, 600.0)?;
        ConfigError::check_range("turn_taking.rearm_seconds", self.rearm_seconds as f64, 0.0, 600.0)?;
        ConfigError::check_positive("turn_taking.quiet_margin_db", self.quiet_margin_db as f64)
    }
}

/// Replay scheduler settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplayConfig {
    /// Tick rate of the replay scheduler (default: 30 Hz)
    pub tick_hz: f32,
    /// Run ticks back to back instead of in real time
    pub fast: bool,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            tick_hz: 30.0,
            fast: false,
        }
    }
}

/// Complete turncue configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TurncueConfig {
    pub decoder: DecoderConfig,
    pub smoothing: SmoothingConfig,
    pub frontal: FrontalConfig,
    pub tracker: TrackerConfig,
    pub attention: AttentionConfig,
    pub vad: VadConfig,
    pub turn_taking: TurnTakingConfig,
    pub modalities: ModalityToggles,
    pub replay: ReplayConfig,
    /// Optional JSON-lines event log
    pub event_log_path: Option<PathBuf>,
    /// Optional detector model file (ONNX builds only)
    pub model_path: Option<PathBuf>,
}

impl TurncueConfig {
    /// Load from `TURNCUE_CONFIG` (if set) and the environment.
    pub fn load() -> EngineResult<Self> {
        let path = std::env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);
        Self::load_from(path.as_deref())
    }

    /// Load from an optional TOML file and the environment.
    pub fn load_from(path: Option<&Path>) -> EngineResult<Self> {
        let mut builder = Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(File::from(path).format(FileFormat::Toml).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("TURNCUE")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config: TurncueConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document over the defaults, without the environment.
    pub fn from_toml_str(toml: &str) -> EngineResult<Self> {
        let config: TurncueConfig = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate every section.
    pub fn validate(&self) -> ConfigResult<()> {
        self.decoder.validate()?;
        self.smoothing.validate()?;
        self.frontal.validate()?;
        self.tracker.validate()?;
        self.attention.validate()?;
        self.vad.validate()?;
        self.turn_taking.validate()?;
        ConfigError::check_positive("replay.tick_hz", self.replay.tick_hz as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_validate() {
        let config = TurncueConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.turn_taking.min_silence_ms, 550.0);
        assert_eq!(config.turn_taking.rearm_seconds, 1.0);
        assert!(config.modalities.visual);
        assert!(!config.modalities.audio);
    }

    #[test]
    fn test_partial_toml_overrides() {
        let config = TurncueConfig::from_toml_str(
            r#"
            event_log_path = "/tmp/turncue.jsonl"

            [turn_taking]
            speak_cooldown_sec = 6.0

            [modalities]
            audio = true
            "#,
        )
        .unwrap();

        assert_eq!(config.turn_taking.speak_cooldown_sec, 6.0);
        assert_eq!(config.turn_taking.hold_cooldown_sec, 1.5);
        assert!(config.modalities.audio);
        assert!(config.modalities.haptic);
        assert_eq!(config.event_log_path, Some(PathBuf::from("/tmp/turncue.jsonl")));
        assert_eq!(config.tracker, TrackerConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let result = TurncueConfig::from_toml_str(
            r#"
            [vad]
            speech_rise_db = 4.0
            speech_hold_db = 6.0
            "#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[attention]\nenter_stable_sec = 1.5").unwrap();

        let config = TurncueConfig::load_from(Some(file.path())).unwrap();
        assert_eq!(config.attention.enter_stable_sec, 1.5);
    }

    #[test]
    fn test_missing_file_is_error() {
        let result = TurncueConfig::load_from(Some(Path::new("/nonexistent/turncue.toml")));
        assert!(result.is_err());
    }
}
