//! Radio construction from configuration

use tracing::info;

use altair_telemetry::{
    Dnt900, LinkConfig, LoopbackDriver, RadioDriver, Rfm23bp, Shx144, TelemetryConfig,
    TelemetryError,
};

/// Build the byte driver described by `link`
pub fn driver_for(
    radio: &str,
    link: &LinkConfig,
) -> Result<Box<dyn RadioDriver>, TelemetryError> {
    match link {
        LinkConfig::Loopback { echo } => {
            info!(radio, echo, "Using loopback driver");
            let (driver, _handle) = if *echo {
                LoopbackDriver::echo()
            } else {
                LoopbackDriver::new()
            };
            Ok(Box::new(driver))
        }
        #[cfg(feature = "serial")]
        LinkConfig::Serial { port, baud_rate } => {
            info!(radio, port = %port.display(), baud_rate, "Using serial driver");
            Ok(Box::new(
                altair_telemetry::SerialDriver::new(port).with_baud_rate(*baud_rate),
            ))
        }
        #[cfg(not(feature = "serial"))]
        LinkConfig::Serial { port, .. } => Err(TelemetryError::InvalidRadioConfig {
            radio: radio.to_string(),
            reason: format!(
                "{} needs the `serial` feature, which this build lacks",
                port.display()
            ),
        }),
    }
}

/// Build the three radios; none is initialized yet
pub fn build_radios(
    config: &TelemetryConfig,
) -> Result<(Dnt900, Shx144, Rfm23bp), TelemetryError> {
    let radios = &config.radios;
    Ok((
        Dnt900::new(driver_for("DNT900", &radios.dnt900.link)?, radios.dnt900.clone()),
        Shx144::new(driver_for("SHX144", &radios.shx144.link)?, radios.shx144.clone()),
        Rfm23bp::new(
            driver_for("RFM23BP", &radios.rfm23bp.link)?,
            radios.rfm23bp.clone(),
        ),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use altair_telemetry::Transport;
    use std::path::PathBuf;

    #[test]
    fn test_loopback_radios() {
        let (mut dnt900, shx144, rfm23bp) = build_radios(&TelemetryConfig::default()).unwrap();
        dnt900.initialize().unwrap();
        assert_eq!(shx144.name(), "SHX144");
        assert_eq!(rfm23bp.config().frequency_mhz, 433.0);
    }

    #[test]
    fn test_echo_link() {
        let mut driver = driver_for("DNT900", &LinkConfig::Loopback { echo: true }).unwrap();
        driver.write(&[0xFA]).unwrap();
        assert_eq!(driver.read_byte(), Some(0xFA));
    }

    #[cfg(not(feature = "serial"))]
    #[test]
    fn test_serial_link_needs_feature() {
        let link = LinkConfig::Serial {
            port: PathBuf::from("/dev/ttyUSB0"),
            baud_rate: 9600,
        };
        let err = driver_for("SHX144", &link).err().unwrap();
        assert!(err.is_fatal());
        assert!(err.to_string().contains("/dev/ttyUSB0"));
    }
}
