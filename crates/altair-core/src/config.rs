//! Configuration types shared by the flight binaries
//!
//! Link-specific settings live in `altair-telemetry`; this module holds the
//! logging and instrument sections of the node configuration.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::source::SensorKind;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default)]
    pub level: LogLevel,
    /// Log format
    #[serde(default)]
    pub format: LogFormat,
    /// Log to file instead of stdout
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Pretty,
            log_file: None,
        }
    }
}

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Filter directive understood by `tracing-subscriber`
    pub fn as_directive(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Log format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable pretty format
    #[default]
    Pretty,
    /// Compact single-line format
    Compact,
}

/// Instrument configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Sensors that must answer at startup
    #[serde(default = "default_required_sensors")]
    pub required_sensors: Vec<SensorKind>,
}

fn default_required_sensors() -> Vec<SensorKind> {
    SensorKind::ALL.to_vec()
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            required_sensors: default_required_sensors(),
        }
    }
}

impl InstrumentConfig {
    /// Whether detection must fail when `sensor` is absent
    pub fn requires(&self, sensor: SensorKind) -> bool {
        self.required_sensors.contains(&sensor)
    }
}
