//! Engine error types.

use thiserror::Error;
use turncue_models::ConfigError;
use turncue_perception::VisionError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(String),

    #[error("Perception error: {0}")]
    Vision(#[from] VisionError),

    #[error("Replay error: {0}")]
    Replay(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl EngineError {
    pub fn config_load(msg: impl Into<String>) -> Self {
        Self::ConfigLoad(msg.into())
    }

    pub fn replay(msg: impl Into<String>) -> Self {
        Self::Replay(msg.into())
    }
}

impl From<config::ConfigError> for EngineError {
    fn from(err: config::ConfigError) -> Self {
        EngineError::ConfigLoad(err.to_string())
    }
}

/// Failure of a single cue channel. Never escapes the dispatcher.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("Channel {channel} failed: {message}")]
    ChannelFailed { channel: String, message: String },

    #[error("Channel {0} is unavailable")]
    Unavailable(String),
}

impl DispatchError {
    pub fn channel_failed(channel: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ChannelFailed {
            channel: channel.into(),
            message: message.into(),
        }
    }
}
