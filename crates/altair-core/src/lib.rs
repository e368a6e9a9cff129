//! ALTAIR Core - Instrument data model for the balloon payload
//!
//! This crate provides the types shared between the instrument collaborators
//! and the telemetry link: the telemetry snapshot, the snapshot source trait,
//! and configuration sections that are not link-specific.
//!
//! # Modules
//!
//! - [`snapshot`] - Typed readings sampled at one instant
//! - [`source`] - Pull-based snapshot source and sensor detection
//! - [`config`] - Logging and instrument configuration
//! - [`error`] - Instrument error types
//!
//! # Example
//!
//! ```rust
//! use altair_core::{GpsFix, SnapshotSource, StaticSource, TelemetrySnapshot};
//! use chrono::NaiveTime;
//!
//! let time = NaiveTime::from_hms_opt(14, 5, 30).unwrap();
//! let snapshot = TelemetrySnapshot {
//!     gps: GpsFix::new(time, 48.4284, -123.3656, 1200.0),
//!     ..Default::default()
//! };
//!
//! let mut source = StaticSource::new(snapshot);
//! source.detect().unwrap();
//! assert_eq!(source.snapshot().unwrap().gps.altitude_m, 1200.0);
//! ```

pub mod config;
pub mod error;
pub mod snapshot;
pub mod source;

// Re-exports for convenience
pub use error::{CoreError, Result};

pub use config::{InstrumentConfig, LogFormat, LogLevel, LoggingConfig};

pub use snapshot::{
    Batteries, EnvReading, Environment, GpsFix, LightReadings, MotorTelemetry, Orientation,
    SensorHealth, ServoReading, Servos, StorageUsage, TelemetrySnapshot, GPS_AGE_NEVER,
    RSSI_UNAVAILABLE,
};

pub use source::{SensorKind, SnapshotSource, StaticSource};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
