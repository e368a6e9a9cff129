//! RFM23BP SPI radio module
//!
//! 433 MHz packet module on the SPI bus, half-wave antenna on the top side
//! of the gondola. The module rejects carrier and power settings outside its
//! band, so those are checked before the driver is touched.

use tracing::{debug, info};

use crate::config::Rfm23bpConfig;
use crate::error::Result;
use crate::interface::{DriverPort, RadioChip, RadioDriver, RadioKind};

/// Lowest carrier frequency the module tunes to, in MHz
pub const MIN_FREQUENCY_MHZ: f32 = 420.0;

/// Highest carrier frequency the module tunes to, in MHz
pub const MAX_FREQUENCY_MHZ: f32 = 450.0;

/// Transmit power range in dBm
pub const TX_POWER_RANGE_DBM: std::ops::RangeInclusive<i8> = 1..=20;

/// RFM23BP transport
#[derive(Debug)]
pub struct Rfm23bp {
    port: DriverPort,
    config: Rfm23bpConfig,
}

impl Rfm23bp {
    /// Create the module over `driver`; the hardware is untouched until
    /// [`initialize`](crate::interface::Transport::initialize)
    pub fn new(driver: Box<dyn RadioDriver>, config: Rfm23bpConfig) -> Self {
        Self {
            port: DriverPort::new(RadioKind::Rfm23bp, driver),
            config,
        }
    }

    /// Initialization settings
    pub fn config(&self) -> &Rfm23bpConfig {
        &self.config
    }

    fn check_settings(&self) -> Result<()> {
        let frequency = self.config.frequency_mhz;
        if !(MIN_FREQUENCY_MHZ..=MAX_FREQUENCY_MHZ).contains(&frequency) {
            return Err(self.port.invalid_config(format!(
                "frequency {frequency} MHz outside {MIN_FREQUENCY_MHZ}-{MAX_FREQUENCY_MHZ} MHz"
            )));
        }
        if !TX_POWER_RANGE_DBM.contains(&self.config.tx_power_dbm) {
            return Err(self.port.invalid_config(format!(
                "tx power {} dBm out of range",
                self.config.tx_power_dbm
            )));
        }
        if self.config.chip_select_pin == self.config.interrupt_pin {
            return Err(self
                .port
                .invalid_config("chip select and interrupt share a pin"));
        }
        Ok(())
    }
}

impl RadioChip for Rfm23bp {
    fn port(&self) -> &DriverPort {
        &self.port
    }

    fn port_mut(&mut self) -> &mut DriverPort {
        &mut self.port
    }

    fn setup(&mut self) -> Result<()> {
        info!(
            frequency_mhz = self.config.frequency_mhz,
            tx_power_dbm = self.config.tx_power_dbm,
            driver = %self.port.describe(),
            "Initializing SPI bus RFM23BP radio"
        );
        self.check_settings()?;
        self.port.initialize()?;

        debug!("RFM23BP radio setup complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TelemetryError;
    use crate::interface::{LoopbackDriver, Transport};

    fn module(config: Rfm23bpConfig) -> (Rfm23bp, crate::interface::LoopbackHandle) {
        let (driver, handle) = LoopbackDriver::new();
        (Rfm23bp::new(Box::new(driver), config), handle)
    }

    #[test]
    fn test_initialize_default_band() {
        let (mut radio, handle) = module(Rfm23bpConfig::default());
        radio.initialize().unwrap();
        assert_eq!(handle.init_count(), 1);
    }

    #[test]
    fn test_out_of_band_frequency_rejected() {
        let config = Rfm23bpConfig {
            frequency_mhz: 915.0,
            ..Default::default()
        };
        let (mut radio, handle) = module(config);

        let err = radio.initialize().unwrap_err();
        assert!(matches!(err, TelemetryError::InvalidRadioConfig { .. }));
        assert!(err.to_string().contains("915"));
        assert_eq!(handle.init_count(), 0);
    }

    #[test]
    fn test_tx_power_range() {
        let config = Rfm23bpConfig {
            tx_power_dbm: 0,
            ..Default::default()
        };
        let (mut radio, _) = module(config);
        assert!(radio.initialize().is_err());
    }

    #[test]
    fn test_rssi_from_driver() {
        let (mut radio, handle) = module(Rfm23bpConfig::default());
        handle.set_rssi(Some(-101));
        assert_eq!(radio.last_rssi(), -101);
    }
}
