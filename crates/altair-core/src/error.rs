//! Error types for instrument access
//!
//! Sensor detection failures are fatal at startup: the payload must not fly
//! with instrumentation silently missing.

use crate::source::SensorKind;
use thiserror::Error;

/// Main error type for instrument and snapshot operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// A required sensor did not answer during detection
    #[error("Sensor not detected: {0}")]
    SensorNotDetected(SensorKind),

    /// A sensor answered but could not produce a reading
    #[error("Reading unavailable from {sensor}: {reason}")]
    ReadingUnavailable {
        /// Sensor that failed
        sensor: SensorKind,
        /// Failure reason
        reason: String,
    },

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl CoreError {
    /// Whether the supervisor must stop instead of continuing
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CoreError::SensorNotDetected(_) | CoreError::InvalidConfig(_)
        )
    }

    /// Get an error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            CoreError::SensorNotDetected(_) => "SENSOR_NOT_DETECTED",
            CoreError::ReadingUnavailable { .. } => "READING_UNAVAILABLE",
            CoreError::InvalidConfig(_) => "INVALID_CONFIG",
        }
    }
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
