//! SHX1-144 serial modem
//!
//! 144 MHz half-duplex modem with a quarter-wave antenna at the back of the
//! payload. The modem raises its busy line while keyed up; reads and
//! re-initialization must wait for it to drop. It does not report RSSI.

use tracing::{debug, info, warn};

use crate::config::Shx144Config;
use crate::error::{Result, TelemetryError};
use crate::interface::{DriverPort, RadioChip, RadioDriver, RadioKind};
use altair_core::RSSI_UNAVAILABLE;

/// SHX144 transport
#[derive(Debug)]
pub struct Shx144 {
    port: DriverPort,
    config: Shx144Config,
}

impl Shx144 {
    /// Create the modem over `driver`; the hardware is untouched until
    /// [`initialize`](crate::interface::Transport::initialize)
    pub fn new(driver: Box<dyn RadioDriver>, config: Shx144Config) -> Self {
        Self {
            port: DriverPort::new(RadioKind::Shx144, driver),
            config,
        }
    }

    /// Initialization settings
    pub fn config(&self) -> &Shx144Config {
        &self.config
    }

    fn check_pins(&self) -> Result<()> {
        let pins = [
            self.config.fake_program_rx_pin,
            self.config.program_pin,
            self.config.busy_pin,
        ];
        for (i, pin) in pins.iter().enumerate() {
            if pins[i + 1..].contains(pin) {
                return Err(self.port.invalid_config(format!("pin {pin} assigned twice")));
            }
        }
        Ok(())
    }
}

impl RadioChip for Shx144 {
    fn port(&self) -> &DriverPort {
        &self.port
    }

    fn port_mut(&mut self) -> &mut DriverPort {
        &mut self.port
    }

    fn setup(&mut self) -> Result<()> {
        info!(
            serial_id = self.config.serial_id,
            program_pin = self.config.program_pin,
            busy_pin = self.config.busy_pin,
            driver = %self.port.describe(),
            "Starting SHX144 serial modem setup"
        );
        self.check_pins()?;

        // Programming the modem while it is keyed up corrupts its settings
        if self.port.is_busy() {
            warn!("SHX144 busy line high during setup");
            return Err(TelemetryError::InitFailed {
                radio: RadioKind::Shx144.name().to_string(),
                reason: "modem busy".to_string(),
            });
        }
        self.port.initialize()?;

        debug!("SHX144 serial modem setup complete");
        Ok(())
    }

    fn rssi(&mut self) -> i8 {
        RSSI_UNAVAILABLE
    }
}
