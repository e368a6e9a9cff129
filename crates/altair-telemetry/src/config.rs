//! Configuration types for the telemetry link
//!
//! This module provides the wire protocol constants, the per-radio
//! initialization settings, and the link behavior options.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::decoder::ReaderRole;
use crate::error::{Result, TelemetryError};

/// Marker opening every frame sent down from the payload
pub const TX_START_BYTE: u8 = 0xFA;

/// Marker opening every frame sent up from a ground station
pub const RX_START_BYTE: u8 = 0xFC;

/// Terminator closing every outbound telemetry frame
pub const FRAME_TERMINATOR: u8 = b'T';

/// Largest frame the length byte can declare
pub const MAX_FRAME_LENGTH: usize = 255;

/// Default number of empty availability polls before a read gives up
pub const DEFAULT_MAX_READ_TRIES: u32 = 100;

/// Upper bound on bytes consumed by a single read call
pub const MAX_BYTES_PER_READ: usize = 4 * (MAX_FRAME_LENGTH + 2);

/// Station identification sent in the clear
pub const CALL_SIGN: &str = " VE7XJA STATION ALTAIR ";

/// Sign-off sent after identification
pub const END_MESSAGE: &str = " OVER ";

/// Default baud rate for the serial-attached radios
pub const DEFAULT_BAUD_RATE: u32 = 9600;

/// Default failover threshold, in consecutive failed frames
pub const DEFAULT_FAILOVER_THRESHOLD: u32 = 3;

/// Main configuration for the telemetry link
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Bring up the first backup radio at boot
    #[serde(default = "default_true")]
    pub enable_backup1: bool,

    /// Bring up the second backup radio at boot (requires `enable_backup1`)
    #[serde(default = "default_true")]
    pub enable_backup2: bool,

    /// Which start marker inbound frames carry
    #[serde(default)]
    pub reader_role: ReaderRole,

    /// Empty availability polls allowed per read
    #[serde(default = "default_max_read_tries")]
    pub max_read_tries: u32,

    /// Interval between full telemetry frames
    #[serde(with = "humantime_serde", default = "default_telemetry_interval")]
    pub telemetry_interval: Duration,

    /// Interval between GPS-only frames
    #[serde(with = "humantime_serde", default = "default_gps_interval")]
    pub gps_interval: Duration,

    /// Interval between call sign transmissions
    #[serde(with = "humantime_serde", default = "default_call_sign_interval")]
    pub call_sign_interval: Duration,

    /// Consecutive failed frames before promoting a backup radio
    #[serde(default = "default_failover_threshold")]
    pub failover_threshold: u32,

    /// Echo received command frames back down as hex text
    #[serde(default)]
    pub echo_commands: bool,

    /// Per-radio settings
    #[serde(default)]
    pub radios: RadiosConfig,
}

fn default_true() -> bool {
    true
}

fn default_max_read_tries() -> u32 {
    DEFAULT_MAX_READ_TRIES
}

fn default_telemetry_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_gps_interval() -> Duration {
    Duration::from_secs(1)
}

fn default_call_sign_interval() -> Duration {
    Duration::from_secs(600) // 10 minutes
}

fn default_failover_threshold() -> u32 {
    DEFAULT_FAILOVER_THRESHOLD
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enable_backup1: true,
            enable_backup2: true,
            reader_role: ReaderRole::default(),
            max_read_tries: DEFAULT_MAX_READ_TRIES,
            telemetry_interval: default_telemetry_interval(),
            gps_interval: default_gps_interval(),
            call_sign_interval: default_call_sign_interval(),
            failover_threshold: DEFAULT_FAILOVER_THRESHOLD,
            echo_commands: false,
            radios: RadiosConfig::default(),
        }
    }
}

impl TelemetryConfig {
    /// Check values that would otherwise fail later in flight
    pub fn validate(&self) -> Result<()> {
        if self.max_read_tries == 0 {
            return Err(TelemetryError::InvalidConfig(
                "max_read_tries must be at least 1".to_string(),
            ));
        }
        if self.failover_threshold == 0 {
            return Err(TelemetryError::InvalidConfig(
                "failover_threshold must be at least 1".to_string(),
            ));
        }
        for (name, interval) in [
            ("telemetry_interval", self.telemetry_interval),
            ("gps_interval", self.gps_interval),
            ("call_sign_interval", self.call_sign_interval),
        ] {
            if interval.is_zero() {
                return Err(TelemetryError::InvalidConfig(format!(
                    "{name} must be non-zero"
                )));
            }
        }
        Ok(())
    }

    /// Whether the second backup radio is brought up at boot
    ///
    /// Backup 2 is only ever initialized together with backup 1.
    pub fn backup2_active(&self) -> bool {
        self.enable_backup1 && self.enable_backup2
    }
}

/// Settings for the three radios
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RadiosConfig {
    /// 910 MHz packet radio
    #[serde(default)]
    pub dnt900: Dnt900Config,
    /// 144 MHz serial modem
    #[serde(default)]
    pub shx144: Shx144Config,
    /// 433 MHz SPI radio
    #[serde(default)]
    pub rfm23bp: Rfm23bpConfig,
}

/// How a radio's byte primitives are reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum LinkConfig {
    /// Serial port (requires the `serial` feature)
    Serial {
        /// Path to serial port (e.g., /dev/ttyUSB0)
        port: PathBuf,
        /// Baud rate (default: 9600)
        #[serde(default = "default_baud_rate")]
        baud_rate: u32,
    },
    /// In-memory loopback, for bench tests without radios attached
    Loopback {
        /// Feed transmitted bytes back to the receive side
        #[serde(default)]
        echo: bool,
    },
}

fn default_baud_rate() -> u32 {
    DEFAULT_BAUD_RATE
}

impl Default for LinkConfig {
    fn default() -> Self {
        LinkConfig::Loopback { echo: false }
    }
}

/// DNT900 initialization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dnt900Config {
    /// Byte link to the radio
    #[serde(default)]
    pub link: LinkConfig,
    /// Hardware serial port number on the flight computer
    #[serde(default = "default_dnt900_serial_id")]
    pub serial_id: u8,
    /// Reset line
    #[serde(default = "default_dnt900_reset_pin")]
    pub reset_pin: u8,
}

fn default_dnt900_serial_id() -> u8 {
    1
}

fn default_dnt900_reset_pin() -> u8 {
    22
}

impl Default for Dnt900Config {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            serial_id: default_dnt900_serial_id(),
            reset_pin: default_dnt900_reset_pin(),
        }
    }
}

/// SHX1-144 initialization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shx144Config {
    /// Byte link to the modem
    #[serde(default)]
    pub link: LinkConfig,
    /// Hardware serial port number on the flight computer
    #[serde(default = "default_shx144_serial_id")]
    pub serial_id: u8,
    /// Receive pin used while the modem is in programming mode
    #[serde(default = "default_shx144_fake_program_rx_pin")]
    pub fake_program_rx_pin: u8,
    /// Programming-mode enable line
    #[serde(default = "default_shx144_program_pin")]
    pub program_pin: u8,
    /// Busy line driven by the modem while it transmits
    #[serde(default = "default_shx144_busy_pin")]
    pub busy_pin: u8,
}

fn default_shx144_serial_id() -> u8 {
    2
}

fn default_shx144_fake_program_rx_pin() -> u8 {
    11
}

fn default_shx144_program_pin() -> u8 {
    12
}

fn default_shx144_busy_pin() -> u8 {
    13
}

impl Default for Shx144Config {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            serial_id: default_shx144_serial_id(),
            fake_program_rx_pin: default_shx144_fake_program_rx_pin(),
            program_pin: default_shx144_program_pin(),
            busy_pin: default_shx144_busy_pin(),
        }
    }
}

/// RFM23BP initialization settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rfm23bpConfig {
    /// Byte link to the module
    #[serde(default)]
    pub link: LinkConfig,
    /// Carrier frequency in MHz
    #[serde(default = "default_rfm23bp_frequency")]
    pub frequency_mhz: f32,
    /// Transmit power in dBm
    #[serde(default = "default_rfm23bp_tx_power")]
    pub tx_power_dbm: i8,
    /// SPI chip select line
    #[serde(default = "default_rfm23bp_chip_select_pin")]
    pub chip_select_pin: u8,
    /// Interrupt line
    #[serde(default = "default_rfm23bp_interrupt_pin")]
    pub interrupt_pin: u8,
}

fn default_rfm23bp_frequency() -> f32 {
    433.0
}

fn default_rfm23bp_tx_power() -> i8 {
    20
}

fn default_rfm23bp_chip_select_pin() -> u8 {
    53
}

fn default_rfm23bp_interrupt_pin() -> u8 {
    2
}

impl Default for Rfm23bpConfig {
    fn default() -> Self {
        Self {
            link: LinkConfig::default(),
            frequency_mhz: default_rfm23bp_frequency(),
            tx_power_dbm: default_rfm23bp_tx_power(),
            chip_select_pin: default_rfm23bp_chip_select_pin(),
            interrupt_pin: default_rfm23bp_interrupt_pin(),
        }
    }
}

/// Builder for TelemetryConfig
#[derive(Debug, Default)]
pub struct TelemetryConfigBuilder {
    config: TelemetryConfig,
}

impl TelemetryConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Choose which backup radios are brought up at boot
    pub fn backups(mut self, backup1: bool, backup2: bool) -> Self {
        self.config.enable_backup1 = backup1;
        self.config.enable_backup2 = backup2;
        self
    }

    /// Set the reader role
    pub fn reader_role(mut self, role: ReaderRole) -> Self {
        self.config.reader_role = role;
        self
    }

    /// Set the empty-poll budget for reads
    pub fn max_read_tries(mut self, tries: u32) -> Self {
        self.config.max_read_tries = tries;
        self
    }

    /// Set the full telemetry interval
    pub fn telemetry_interval(mut self, interval: Duration) -> Self {
        self.config.telemetry_interval = interval;
        self
    }

    /// Set the GPS-only frame interval
    pub fn gps_interval(mut self, interval: Duration) -> Self {
        self.config.gps_interval = interval;
        self
    }

    /// Set the failover threshold
    pub fn failover_threshold(mut self, frames: u32) -> Self {
        self.config.failover_threshold = frames;
        self
    }

    /// Echo received command frames as hex text
    pub fn echo_commands(mut self, echo: bool) -> Self {
        self.config.echo_commands = echo;
        self
    }

    /// Attach the DNT900 to a serial port
    pub fn dnt900_port(mut self, port: impl Into<PathBuf>, baud_rate: u32) -> Self {
        self.config.radios.dnt900.link = LinkConfig::Serial {
            port: port.into(),
            baud_rate,
        };
        self
    }

    /// Attach the SHX144 to a serial port
    pub fn shx144_port(mut self, port: impl Into<PathBuf>, baud_rate: u32) -> Self {
        self.config.radios.shx144.link = LinkConfig::Serial {
            port: port.into(),
            baud_rate,
        };
        self
    }

    /// Set the RFM23BP carrier frequency
    pub fn rfm23bp_frequency(mut self, frequency_mhz: f32) -> Self {
        self.config.radios.rfm23bp.frequency_mhz = frequency_mhz;
        self
    }

    /// Build the configuration
    pub fn build(self) -> TelemetryConfig {
        self.config
    }
}

// Custom serde module for Duration with humantime
mod humantime_serde {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let s = humantime::format_duration(*duration).to_string();
        serializer.serialize_str(&s)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        humantime::parse_duration(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert!(config.enable_backup1);
        assert!(config.backup2_active());
        assert_eq!(config.max_read_tries, DEFAULT_MAX_READ_TRIES);
        assert_eq!(config.reader_role, ReaderRole::Onboard);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = TelemetryConfigBuilder::new()
            .backups(true, false)
            .reader_role(ReaderRole::GroundStation)
            .max_read_tries(250)
            .failover_threshold(5)
            .dnt900_port("/dev/ttyUSB0", 115200)
            .build();

        assert!(!config.backup2_active());
        assert_eq!(config.max_read_tries, 250);
        assert_eq!(config.failover_threshold, 5);
        assert_eq!(
            config.radios.dnt900.link,
            LinkConfig::Serial {
                port: PathBuf::from("/dev/ttyUSB0"),
                baud_rate: 115200,
            }
        );
    }

    #[test]
    fn test_backup2_requires_backup1() {
        let config = TelemetryConfigBuilder::new().backups(false, true).build();
        assert!(!config.backup2_active());
    }

    #[test]
    fn test_validate_rejects_zero_budget() {
        let config = TelemetryConfigBuilder::new().max_read_tries(0).build();
        assert!(matches!(
            config.validate(),
            Err(TelemetryError::InvalidConfig(_))
        ));

        let config = TelemetryConfigBuilder::new()
            .telemetry_interval(Duration::ZERO)
            .build();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_deserialize_with_humantime() {
        let json = r#"{
            "telemetry_interval": "10s",
            "reader_role": "ground_station",
            "radios": {
                "shx144": { "link": { "type": "serial", "port": "/dev/ttyACM0" } }
            }
        }"#;
        let config: TelemetryConfig = serde_json::from_str(json).unwrap();

        assert_eq!(config.telemetry_interval, Duration::from_secs(10));
        assert_eq!(config.gps_interval, Duration::from_secs(1));
        assert_eq!(config.reader_role, ReaderRole::GroundStation);
        assert_eq!(
            config.radios.shx144.link,
            LinkConfig::Serial {
                port: PathBuf::from("/dev/ttyACM0"),
                baud_rate: DEFAULT_BAUD_RATE,
            }
        );
        assert_eq!(config.radios.rfm23bp.frequency_mhz, 433.0);
    }
}
