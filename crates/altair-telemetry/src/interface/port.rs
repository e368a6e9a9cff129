//! Driver port shared by the radios
//!
//! [`DriverPort`] owns a radio's [`RadioDriver`] and maps driver failures to
//! [`TelemetryError`]s named after the radio. A radio type implements
//! [`RadioChip`] with its own setup and RSSI rules and gets [`Transport`]
//! from the blanket impl below.

use tracing::trace;

use crate::error::{Result, TelemetryError};
use crate::interface::{RadioDriver, RadioKind, Transport};
use altair_core::RSSI_UNAVAILABLE;

/// A radio's driver plus its identity
pub struct DriverPort {
    kind: RadioKind,
    driver: Box<dyn RadioDriver>,
}

impl DriverPort {
    /// Wrap `driver` for the radio `kind`
    pub fn new(kind: RadioKind, driver: Box<dyn RadioDriver>) -> Self {
        Self { kind, driver }
    }

    /// Radio identity
    pub fn kind(&self) -> RadioKind {
        self.kind
    }

    /// Driver description for logs
    pub fn describe(&self) -> String {
        self.driver.describe()
    }

    /// Hand bytes to the driver
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        trace!(radio = %self.kind, bytes = bytes.len(), "Writing");
        self.driver
            .write(bytes)
            .map_err(|e| TelemetryError::WriteError {
                radio: self.kind.name().to_string(),
                reason: e.to_string(),
            })
    }

    /// Whether a received byte is waiting
    pub fn bytes_available(&mut self) -> bool {
        self.driver.bytes_available()
    }

    /// Take one received byte
    pub fn read_byte(&mut self) -> Option<u8> {
        self.driver.read_byte()
    }

    /// Whether the driver reports busy
    pub fn is_busy(&mut self) -> bool {
        self.driver.is_busy()
    }

    /// Driver RSSI, or the sentinel when it has none
    pub fn rssi(&mut self) -> i8 {
        self.driver.last_rssi().unwrap_or(RSSI_UNAVAILABLE)
    }

    /// Bring the driver up
    pub fn initialize(&mut self) -> Result<()> {
        self.driver
            .initialize()
            .map_err(|e| TelemetryError::InitFailed {
                radio: self.kind.name().to_string(),
                reason: e.to_string(),
            })
    }

    /// Settings error for this radio
    pub fn invalid_config(&self, reason: impl Into<String>) -> TelemetryError {
        TelemetryError::InvalidRadioConfig {
            radio: self.kind.name().to_string(),
            reason: reason.into(),
        }
    }
}

impl std::fmt::Debug for DriverPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DriverPort")
            .field("kind", &self.kind)
            .field("driver", &self.driver.describe())
            .finish()
    }
}

/// Radio-specific behaviour on top of a [`DriverPort`]
pub trait RadioChip {
    /// The radio's port
    fn port(&self) -> &DriverPort;

    /// Mutable port
    fn port_mut(&mut self) -> &mut DriverPort;

    /// Check settings and bring the radio up; no retry
    fn setup(&mut self) -> Result<()>;

    /// RSSI of the last received frame
    fn rssi(&mut self) -> i8 {
        self.port_mut().rssi()
    }
}

impl<T: RadioChip> Transport for T {
    fn send_byte(&mut self, byte: u8) -> Result<()> {
        self.port_mut().write(&[byte])
    }

    fn send_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.port_mut().write(bytes)
    }

    fn available(&mut self) -> bool {
        self.port_mut().bytes_available()
    }

    fn is_busy(&mut self) -> bool {
        self.port_mut().is_busy()
    }

    fn initialize(&mut self) -> Result<()> {
        self.setup()
    }

    fn read(&mut self) -> Option<u8> {
        self.port_mut().read_byte()
    }

    fn name(&self) -> &str {
        self.port().kind().name()
    }

    fn kind(&self) -> RadioKind {
        self.port().kind()
    }

    fn last_rssi(&mut self) -> i8 {
        self.rssi()
    }
}
