//! Snapshot source collaborator
//!
//! The instrument drivers (orientation, BME280s, GPS, motor microcontroller,
//! storage, light monitor) live outside this workspace. The telemetry link
//! reaches them only through [`SnapshotSource`], a pull-based query surface.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::snapshot::TelemetrySnapshot;

/// Sensors that must be present before flight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorKind {
    /// Orientation sensor
    Orientation,
    /// GPS receiver
    Gps,
    /// Pressure/temperature/humidity sensor on the mast
    MastEnvironment,
    /// Pressure/temperature/humidity sensor inside the payload
    PayloadEnvironment,
    /// Pressure/temperature/humidity sensor at the balloon valve
    BalloonEnvironment,
    /// Motor microcontroller
    MotorController,
    /// Light source monitor ADC
    LightMonitor,
}

impl SensorKind {
    /// All sensor kinds, in detection order
    pub const ALL: [SensorKind; 7] = [
        SensorKind::Orientation,
        SensorKind::Gps,
        SensorKind::MastEnvironment,
        SensorKind::PayloadEnvironment,
        SensorKind::BalloonEnvironment,
        SensorKind::MotorController,
        SensorKind::LightMonitor,
    ];
}

impl std::fmt::Display for SensorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SensorKind::Orientation => write!(f, "orientation"),
            SensorKind::Gps => write!(f, "gps"),
            SensorKind::MastEnvironment => write!(f, "mast environment"),
            SensorKind::PayloadEnvironment => write!(f, "payload environment"),
            SensorKind::BalloonEnvironment => write!(f, "balloon environment"),
            SensorKind::MotorController => write!(f, "motor controller"),
            SensorKind::LightMonitor => write!(f, "light monitor"),
        }
    }
}

/// Pull-based access to the instrument readings
pub trait SnapshotSource {
    /// Check that every required sensor answers
    ///
    /// Called once at startup. An `Err` here is fatal.
    fn detect(&mut self) -> Result<()>;

    /// Sample all readings at this instant
    fn snapshot(&mut self) -> Result<TelemetrySnapshot>;
}

/// Source that always returns the same snapshot
///
/// Useful for bench tests of the radio link without instruments attached.
#[derive(Debug, Clone, Default)]
pub struct StaticSource {
    snapshot: TelemetrySnapshot,
    missing: Vec<SensorKind>,
}

impl StaticSource {
    /// Create a source returning `snapshot`
    pub fn new(snapshot: TelemetrySnapshot) -> Self {
        Self {
            snapshot,
            missing: Vec::new(),
        }
    }

    /// Pretend a sensor is absent during detection
    pub fn without(mut self, sensor: SensorKind) -> Self {
        self.missing.push(sensor);
        self
    }
}

impl SnapshotSource for StaticSource {
    fn detect(&mut self) -> Result<()> {
        match self.missing.first() {
            Some(sensor) => Err(CoreError::SensorNotDetected(*sensor)),
            None => Ok(()),
        }
    }

    fn snapshot(&mut self) -> Result<TelemetrySnapshot> {
        Ok(self.snapshot.clone())
    }
}
