//! Error types for perception operations.

use std::path::PathBuf;
use thiserror::Error;
use turncue_models::ConfigError;

/// Result type for perception operations.
pub type VisionResult<T> = Result<T, VisionError>;

/// Errors that can occur in the perception stages.
///
/// Absence of faces is never an error; these cover resource and
/// configuration failures only.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("Model not found: {0}")]
    ModelNotFound(PathBuf),

    #[error("Inference failed: {0}")]
    InferenceFailed(String),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Unexpected output size: expected {expected}, got {got}")]
    OutputShape { expected: usize, got: usize },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl VisionError {
    /// Create an inference failure error.
    pub fn inference_failed(message: impl Into<String>) -> Self {
        Self::InferenceFailed(message.into())
    }

    /// Create an invalid frame error.
    pub fn invalid_frame(message: impl Into<String>) -> Self {
        Self::InvalidFrame(message.into())
    }

    /// Create a model not found error.
    pub fn model_not_found(path: impl Into<PathBuf>) -> Self {
        Self::ModelNotFound(path.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}
