//! DNT900 packet radio
//!
//! 910 MHz frequency-hopping transceiver on a hardware UART, with its
//! half-wave antenna at the front of the payload. It is the default primary
//! radio and the only one that reports RSSI per received packet.

use tracing::{debug, info};

use crate::config::Dnt900Config;
use crate::error::Result;
use crate::interface::{DriverPort, RadioChip, RadioDriver, RadioKind};

/// DNT900 transport
#[derive(Debug)]
pub struct Dnt900 {
    port: DriverPort,
    config: Dnt900Config,
}

impl Dnt900 {
    /// Create the radio over `driver`; the hardware is untouched until
    /// [`initialize`](crate::interface::Transport::initialize)
    pub fn new(driver: Box<dyn RadioDriver>, config: Dnt900Config) -> Self {
        Self {
            port: DriverPort::new(RadioKind::Dnt900, driver),
            config,
        }
    }

    /// Initialization settings
    pub fn config(&self) -> &Dnt900Config {
        &self.config
    }
}

impl RadioChip for Dnt900 {
    fn port(&self) -> &DriverPort {
        &self.port
    }

    fn port_mut(&mut self) -> &mut DriverPort {
        &mut self.port
    }

    fn setup(&mut self) -> Result<()> {
        info!(
            serial_id = self.config.serial_id,
            reset_pin = self.config.reset_pin,
            driver = %self.port.describe(),
            "Starting DNT900 radio setup"
        );

        if self.config.serial_id == 0 {
            return Err(self
                .port
                .invalid_config("serial port 0 is reserved for the console"));
        }
        self.port.initialize()?;

        debug!("DNT900 radio setup complete");
        Ok(())
    }
}
