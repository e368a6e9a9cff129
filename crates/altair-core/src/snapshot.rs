//! Telemetry snapshot types
//!
//! A [`TelemetrySnapshot`] is the read-only aggregate of every reading that
//! goes into a downlink frame, sampled at one instant by the instrument
//! collaborator. It owns no resources and lives only as long as the call
//! that encodes it.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// RSSI value reported when the radio could not measure the last frame
pub const RSSI_UNAVAILABLE: i8 = 127;

/// GPS fix age transmitted when the receiver never produced a fix
pub const GPS_AGE_NEVER: u16 = u16::MAX;

/// Complete set of readings for one full-telemetry frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    /// Position, time, and fix quality from the GPS receiver
    pub gps: GpsFix,
    /// Link RSSI of the active radio in dBm ([`RSSI_UNAVAILABLE`] if unknown)
    pub rssi: i8,
    /// Primary orientation sensor output
    pub orientation: Orientation,
    /// Battery voltages
    pub batteries: Batteries,
    /// Pressure / temperature / humidity at the three sensor locations
    pub environment: Environment,
    /// Motor controller telemetry and power settings
    pub motors: MotorTelemetry,
    /// Servo settings and positions
    pub servos: Servos,
    /// Data storage occupancy
    pub storage: StorageUsage,
    /// Light source monitor readings
    pub light: LightReadings,
}

impl TelemetrySnapshot {
    /// Replace the RSSI with the value measured by the active radio
    pub fn with_rssi(mut self, rssi: i8) -> Self {
        self.rssi = rssi;
        self
    }
}

impl Default for TelemetrySnapshot {
    fn default() -> Self {
        Self {
            gps: GpsFix::default(),
            rssi: RSSI_UNAVAILABLE,
            orientation: Orientation::default(),
            batteries: Batteries::default(),
            environment: Environment::default(),
            motors: MotorTelemetry::default(),
            servos: Servos::default(),
            storage: StorageUsage::default(),
            light: LightReadings::default(),
        }
    }
}

/// GPS receiver output
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GpsFix {
    /// UTC time of day
    pub time: NaiveTime,
    /// Latitude in degrees (-90 to 90)
    pub latitude: f64,
    /// Longitude in degrees (-180 to 180)
    pub longitude: f64,
    /// Altitude above mean sea level in meters
    pub altitude_m: f64,
    /// Milliseconds since the last position update, `None` if never updated
    pub age_ms: Option<u32>,
    /// Horizontal dilution of precision as reported by the receiver (hundredths)
    pub hdop: i32,
}

impl GpsFix {
    /// Create a fix with no age or HDOP information
    pub fn new(time: NaiveTime, latitude: f64, longitude: f64, altitude_m: f64) -> Self {
        Self {
            time,
            latitude,
            longitude,
            altitude_m,
            age_ms: None,
            hdop: 0,
        }
    }

    /// Set the fix age
    pub fn with_age(mut self, age_ms: u32) -> Self {
        self.age_ms = Some(age_ms);
        self
    }

    /// Set the HDOP
    pub fn with_hdop(mut self, hdop: i32) -> Self {
        self.hdop = hdop;
        self
    }

    /// Whether the receiver ever delivered a position
    pub fn has_fix(&self) -> bool {
        self.age_ms.is_some()
    }
}

/// Health of the orientation sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorHealth {
    /// Calibrated and reporting
    #[default]
    Healthy,
    /// Reporting, but calibration or self-test is not complete
    Degraded,
}

/// Orientation sensor output
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Orientation {
    /// Yaw in sensor units
    pub yaw: i16,
    /// Pitch in sensor units
    pub pitch: i16,
    /// Roll in sensor units
    pub roll: i16,
    /// Acceleration (x, y, z) in sensor units
    pub accel: [i16; 3],
    /// Die temperature in degrees C
    pub temperature_c: i8,
    /// Sensor type identifier
    pub sensor_type: u8,
    /// Sensor health
    pub health: SensorHealth,
}

impl Orientation {
    /// Sensor type and health packed into one byte (health in the top bit)
    pub fn type_and_health(&self) -> u8 {
        let health = match self.health {
            SensorHealth::Healthy => 0x80,
            SensorHealth::Degraded => 0x00,
        };
        (self.sensor_type & 0x7F) | health
    }
}

/// Battery voltages in volts
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Batteries {
    /// General operations battery
    pub general_ops_v: f32,
    /// Propulsion battery
    pub propulsion_v: f32,
}

/// One pressure / temperature / humidity sensor reading
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct EnvReading {
    /// Pressure in pascals
    pub pressure_pa: f32,
    /// Temperature in degrees C
    pub temperature_c: f32,
    /// Relative humidity in percent
    pub humidity_pct: f32,
}

impl EnvReading {
    /// Create a reading
    pub fn new(pressure_pa: f32, temperature_c: f32, humidity_pct: f32) -> Self {
        Self {
            pressure_pa,
            temperature_c,
            humidity_pct,
        }
    }
}

/// Environmental readings at the three sensor locations
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Environment {
    /// Outside air, on the mast
    pub outside: EnvReading,
    /// Inside the payload
    pub internal: EnvReading,
    /// At the balloon valve (reads garbage once the cutdown pulls the connector)
    pub balloon: EnvReading,
}

/// Motor controller telemetry
///
/// The packed arrays arrive pre-packed from the motor microcontroller and are
/// transmitted byte for byte.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MotorTelemetry {
    /// Packed RPM of the four motors
    pub packed_rpm: [u8; 4],
    /// Packed current draw of the four motors
    pub packed_current: [u8; 4],
    /// Packed temperatures (motors and controllers)
    pub packed_temperature: [u8; 8],
    /// Power settings: port outer, port inner, starboard inner, starboard outer
    pub power: [f32; 4],
}

/// Setting and measured position of one servo
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ServoReading {
    /// Commanded setting
    pub setting: f32,
    /// Position feedback voltage (0 to 5.1 V)
    pub position_v: f32,
}

/// The three servos on the gondola
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Servos {
    /// Propeller axle rotation
    pub axle_rotation: ServoReading,
    /// Balloon bleed valve
    pub bleed_valve: ServoReading,
    /// Cutdown mechanism
    pub cutdown: ServoReading,
}

/// Data storage occupancy, in the units reported by the storage system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StorageUsage {
    /// Occupied space
    pub occupied: u16,
    /// Remaining space
    pub free: u16,
}

/// Light source monitor readings
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LightReadings {
    /// Light subsystem status byte
    pub status: u8,
    /// Single-ended ADC readings of photodiodes 1, 2 and 3
    pub photodiodes: [u16; 3],
    /// Differential ADC reading between photodiodes 1 and 2
    pub differential_12: i16,
}
