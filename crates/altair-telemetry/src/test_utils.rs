//! Test utilities for exercising the link without radios attached
//!
//! - [`MockTransport`]: a scriptable [`Transport`] for encoder and reader tests
//! - [`TestFixture`]: a [`TelemetrySystem`] over three loopback radios, with
//!   the handles needed to inspect and disturb each one
//! - [`sample_snapshot`]: a realistic mid-flight snapshot
//!
//! # Example
//!
//! ```rust
//! use altair_telemetry::test_utils::{sample_snapshot, TestFixture};
//!
//! let mut fixture = TestFixture::new();
//! fixture.system.initialize_all(true, true).unwrap();
//! fixture.system.send_telemetry(&sample_snapshot()).unwrap();
//! assert_eq!(fixture.dnt900.written().len(), 73);
//! ```

use chrono::NaiveTime;
use std::collections::VecDeque;

use crate::config::{TelemetryConfig, TelemetryConfigBuilder};
use crate::error::{Result, TelemetryError};
use crate::interface::{
    Dnt900, LoopbackDriver, LoopbackHandle, RadioKind, Rfm23bp, Shx144, Transport,
};
use crate::system::TelemetrySystem;
use altair_core::{
    Batteries, EnvReading, Environment, GpsFix, LightReadings, MotorTelemetry, ServoReading,
    Servos, StorageUsage, TelemetrySnapshot, RSSI_UNAVAILABLE,
};

/// Scriptable transport
///
/// Written bytes are recorded, queued bytes are served one at a time, and
/// every availability poll is counted.
#[derive(Debug)]
pub struct MockTransport {
    kind: RadioKind,
    incoming: VecDeque<u8>,
    sent: Vec<u8>,
    busy: bool,
    fail_writes: bool,
    fail_next: u32,
    fail_init: bool,
    init_count: u32,
    available_polls: u32,
    rssi: i8,
}

impl MockTransport {
    /// Create a mock posing as the DNT900
    pub fn new() -> Self {
        Self::with_kind(RadioKind::Dnt900)
    }

    /// Create a mock posing as `kind`
    pub fn with_kind(kind: RadioKind) -> Self {
        Self {
            kind,
            incoming: VecDeque::new(),
            sent: Vec::new(),
            busy: false,
            fail_writes: false,
            fail_next: 0,
            fail_init: false,
            init_count: 0,
            available_polls: 0,
            rssi: RSSI_UNAVAILABLE,
        }
    }

    /// Queue bytes to be read
    pub fn queue_incoming(&mut self, bytes: &[u8]) {
        self.incoming.extend(bytes.iter().copied());
    }

    /// Bytes not yet read
    pub fn pending(&self) -> usize {
        self.incoming.len()
    }

    /// Bytes written so far
    pub fn sent(&self) -> &[u8] {
        &self.sent
    }

    /// Number of `available()` calls so far
    pub fn available_polls(&self) -> u32 {
        self.available_polls
    }

    /// Number of successful initializations
    pub fn init_count(&self) -> u32 {
        self.init_count
    }

    /// Report busy
    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    /// Fail every write
    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }

    /// Fail the next `count` writes
    pub fn fail_next_writes(&mut self, count: u32) {
        self.fail_next = count;
    }

    /// Fail initialization
    pub fn set_fail_init(&mut self, fail: bool) {
        self.fail_init = fail;
    }

    /// Set the reported RSSI
    pub fn set_rssi(&mut self, rssi: i8) {
        self.rssi = rssi;
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for MockTransport {
    fn send_byte(&mut self, byte: u8) -> Result<()> {
        self.send_bytes(&[byte])
    }

    fn send_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if self.fail_writes || self.fail_next > 0 {
            self.fail_next = self.fail_next.saturating_sub(1);
            return Err(TelemetryError::WriteError {
                radio: self.name().to_string(),
                reason: "simulated failure".to_string(),
            });
        }
        self.sent.extend_from_slice(bytes);
        Ok(())
    }

    fn available(&mut self) -> bool {
        self.available_polls += 1;
        !self.incoming.is_empty()
    }

    fn is_busy(&mut self) -> bool {
        self.busy
    }

    fn initialize(&mut self) -> Result<()> {
        if self.fail_init {
            return Err(TelemetryError::InitFailed {
                radio: self.name().to_string(),
                reason: "simulated failure".to_string(),
            });
        }
        self.init_count += 1;
        Ok(())
    }

    fn read(&mut self) -> Option<u8> {
        self.incoming.pop_front()
    }

    fn name(&self) -> &str {
        self.kind.name()
    }

    fn kind(&self) -> RadioKind {
        self.kind
    }

    fn last_rssi(&mut self) -> i8 {
        self.rssi
    }
}

/// Snapshot resembling a payload at altitude over Victoria, BC
pub fn sample_snapshot() -> TelemetrySnapshot {
    let time = NaiveTime::from_hms_opt(14, 5, 30).unwrap_or_default();
    TelemetrySnapshot {
        gps: GpsFix::new(time, 48.4284, -123.3656, 1200.0)
            .with_age(850)
            .with_hdop(120),
        rssi: -87,
        batteries: Batteries {
            general_ops_v: 11.95,
            propulsion_v: 12.4,
        },
        environment: Environment {
            outside: EnvReading::new(87_600.0, -4.5, 41.0),
            internal: EnvReading::new(88_010.0, 18.2, 22.5),
            balloon: EnvReading::new(87_590.0, -6.0, 40.0),
        },
        motors: MotorTelemetry {
            packed_rpm: [12, 12, 11, 12],
            packed_current: [3, 4, 4, 3],
            packed_temperature: [30, 31, 29, 30, 35, 35, 34, 36],
            power: [0.5, 0.5, 0.45, 0.5],
        },
        servos: Servos {
            axle_rotation: ServoReading {
                setting: 1.5,
                position_v: 2.5,
            },
            bleed_valve: ServoReading {
                setting: 0.0,
                position_v: 0.12,
            },
            cutdown: ServoReading {
                setting: 0.0,
                position_v: 0.1,
            },
        },
        storage: StorageUsage {
            occupied: 1_024,
            free: 30_720,
        },
        light: LightReadings {
            status: 0x03,
            photodiodes: [512, 498, 7],
            differential_12: -14,
        },
        ..Default::default()
    }
}

/// A telemetry system over three loopback radios
pub struct TestFixture {
    /// System under test
    pub system: TelemetrySystem,
    /// DNT900 driver handle
    pub dnt900: LoopbackHandle,
    /// SHX144 driver handle
    pub shx144: LoopbackHandle,
    /// RFM23BP driver handle
    pub rfm23bp: LoopbackHandle,
}

impl TestFixture {
    /// Create with the default configuration
    pub fn new() -> Self {
        Self::with_config(&TelemetryConfigBuilder::new().build())
    }

    /// Create with a custom configuration
    pub fn with_config(config: &TelemetryConfig) -> Self {
        let (dnt900_driver, dnt900) = LoopbackDriver::new();
        let (shx144_driver, shx144) = LoopbackDriver::new();
        let (rfm23bp_driver, rfm23bp) = LoopbackDriver::new();

        let radios = &config.radios;
        let system = TelemetrySystem::new(
            Dnt900::new(Box::new(dnt900_driver), radios.dnt900.clone()),
            Shx144::new(Box::new(shx144_driver), radios.shx144.clone()),
            Rfm23bp::new(Box::new(rfm23bp_driver), radios.rfm23bp.clone()),
            config,
        );

        Self {
            system,
            dnt900,
            shx144,
            rfm23bp,
        }
    }

    /// Driver handle of one radio
    pub fn handle(&self, kind: RadioKind) -> &LoopbackHandle {
        match kind {
            RadioKind::Dnt900 => &self.dnt900,
            RadioKind::Shx144 => &self.shx144,
            RadioKind::Rfm23bp => &self.rfm23bp,
        }
    }

    /// Initializations across all three radios
    pub fn total_inits(&self) -> u32 {
        RadioKind::ALL
            .iter()
            .map(|kind| self.handle(*kind).init_count())
            .sum()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
