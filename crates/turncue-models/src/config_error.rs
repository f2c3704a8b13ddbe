//! Configuration validation errors.

use thiserror::Error;

/// Result type for configuration validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised by component `validate()` methods.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be within {min}..={max}, got {value}")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("{field} must be positive, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    #[error("{looser} must not be tighter than {tighter}")]
    InvertedHysteresis {
        tighter: &'static str,
        looser: &'static str,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

impl ConfigError {
    /// Check that `value` lies in `min..=max`.
    pub fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> ConfigResult<()> {
        if value.is_finite() && value >= min && value <= max {
            Ok(())
        } else {
            Err(Self::OutOfRange {
                field,
                value,
                min,
                max,
            })
        }
    }

    /// Check that `value` is strictly positive.
    pub fn check_positive(field: &'static str, value: f64) -> ConfigResult<()> {
        if value.is_finite() && value > 0.0 {
            Ok(())
        } else {
            Err(Self::NotPositive { field, value })
        }
    }

    /// Create a generic invalid-configuration error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }
}
