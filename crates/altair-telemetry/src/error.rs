//! Error types for telemetry link operations
//!
//! Write failures and busy radios are routine on a narrow-band link and are
//! reported, never retried here. Initialization and configuration failures
//! are fatal: the supervisor decides whether to halt.

use thiserror::Error;

/// Main error type for telemetry link operations
#[derive(Error, Debug)]
pub enum TelemetryError {
    // ===== Transport Errors =====
    /// A byte could not be handed to the radio
    #[error("Write to {radio} failed: {reason}")]
    WriteError {
        /// Radio name
        radio: String,
        /// Failure reason
        reason: String,
    },

    /// The radio cannot accept a read request right now
    #[error("Radio {radio} is busy")]
    TransportBusy {
        /// Radio name
        radio: String,
    },

    /// Radio initialization failed
    #[error("Radio {radio} initialization failed: {reason}")]
    InitFailed {
        /// Radio name
        radio: String,
        /// Failure reason
        reason: String,
    },

    /// Radio settings are outside what the hardware accepts
    #[error("Invalid {radio} settings: {reason}")]
    InvalidRadioConfig {
        /// Radio name
        radio: String,
        /// What is wrong
        reason: String,
    },

    // ===== Serial Errors =====
    /// Serial port not found
    #[error("Serial port not found: {0}")]
    PortNotFound(String),

    /// Serial port open failed
    #[error("Failed to open serial port {port}: {reason}")]
    PortOpenFailed {
        /// Port path
        port: String,
        /// Failure reason
        reason: String,
    },

    // ===== Configuration Errors =====
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// IO error wrapper
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TelemetryError {
    /// Check if this error is transient and the operation may be tried again
    pub fn is_retriable(&self) -> bool {
        matches!(
            self,
            TelemetryError::WriteError { .. } | TelemetryError::TransportBusy { .. }
        )
    }

    /// Check if the link cannot continue after this error
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            TelemetryError::InitFailed { .. }
                | TelemetryError::InvalidRadioConfig { .. }
                | TelemetryError::InvalidConfig(_)
        )
    }

    /// Get an error code for logging
    pub fn error_code(&self) -> &'static str {
        match self {
            TelemetryError::WriteError { .. } => "WRITE_ERROR",
            TelemetryError::TransportBusy { .. } => "TRANSPORT_BUSY",
            TelemetryError::InitFailed { .. } => "INIT_FAILED",
            TelemetryError::InvalidRadioConfig { .. } => "INVALID_RADIO_CONFIG",
            TelemetryError::PortNotFound(_) => "PORT_NOT_FOUND",
            TelemetryError::PortOpenFailed { .. } => "PORT_OPEN_FAILED",
            TelemetryError::InvalidConfig(_) => "INVALID_CONFIG",
            TelemetryError::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias for telemetry operations
pub type Result<T> = std::result::Result<T, TelemetryError>;

// Conversion from serialport error (only when serial feature is enabled)
#[cfg(feature = "serial")]
impl From<serialport::Error> for TelemetryError {
    fn from(err: serialport::Error) -> Self {
        match err.kind {
            serialport::ErrorKind::NoDevice => TelemetryError::PortNotFound(err.description),
            serialport::ErrorKind::Io(kind) => {
                TelemetryError::Io(std::io::Error::new(kind, err.description))
            }
            _ => TelemetryError::PortOpenFailed {
                port: String::new(),
                reason: err.description,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        let err = TelemetryError::TransportBusy {
            radio: "SHX144".to_string(),
        };
        assert_eq!(err.error_code(), "TRANSPORT_BUSY");
        assert_eq!(err.to_string(), "Radio SHX144 is busy");
    }

    #[test]
    fn test_is_retriable() {
        assert!(TelemetryError::TransportBusy {
            radio: "DNT900".to_string()
        }
        .is_retriable());
        assert!(TelemetryError::WriteError {
            radio: "DNT900".to_string(),
            reason: "timed out".to_string(),
        }
        .is_retriable());
        assert!(!TelemetryError::InvalidConfig("x".to_string()).is_retriable());
    }

    #[test]
    fn test_init_failure_is_fatal() {
        let err = TelemetryError::InitFailed {
            radio: "RFM23BP".to_string(),
            reason: "no response".to_string(),
        };
        assert!(err.is_fatal());
        assert!(!err.is_retriable());
        assert!(err.to_string().contains("RFM23BP"));
        assert!(err.to_string().contains("no response"));
    }
}
