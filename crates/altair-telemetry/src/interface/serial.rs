//! Serial port radio driver
//!
//! Drives a UART-attached radio through the `serialport` crate. The port is
//! opened on [`initialize`](RadioDriver::initialize), so building a radio
//! never touches the hardware.

use serialport::{SerialPort, SerialPortType};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, error, info, trace, warn};

use crate::config::DEFAULT_BAUD_RATE;
use crate::error::Result;
use crate::interface::RadioDriver;

/// Read timeout; availability is always checked before reading
const READ_TIMEOUT: Duration = Duration::from_millis(10);

/// UART driver for one radio
pub struct SerialDriver {
    port_path: PathBuf,
    baud_rate: u32,
    port: Option<Box<dyn SerialPort>>,
}

impl SerialDriver {
    /// Create a driver for `port`; nothing is opened yet
    pub fn new(port: impl AsRef<Path>) -> Self {
        Self {
            port_path: port.as_ref().to_path_buf(),
            baud_rate: DEFAULT_BAUD_RATE,
            port: None,
        }
    }

    /// Create with custom baud rate
    pub fn with_baud_rate(mut self, baud_rate: u32) -> Self {
        self.baud_rate = baud_rate;
        self
    }

    /// Get the port path
    pub fn port_path(&self) -> &Path {
        &self.port_path
    }

    /// Whether the port has been opened
    pub fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn not_open() -> io::Error {
        io::Error::new(io::ErrorKind::NotConnected, "serial port not open")
    }
}

impl RadioDriver for SerialDriver {
    fn initialize(&mut self) -> io::Result<()> {
        // Re-initializing a demoted radio reopens the port
        self.port = None;

        info!(port = %self.port_path.display(), baud = self.baud_rate, "Opening serial port");
        if !self.port_path.exists() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} does not exist", self.port_path.display()),
            ));
        }

        let port = serialport::new(self.port_path.to_string_lossy(), self.baud_rate)
            .timeout(READ_TIMEOUT)
            .open()?;
        port.clear(serialport::ClearBuffer::All)?;

        self.port = Some(port);
        debug!(port = %self.port_path.display(), "Serial port open");
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let port = self.port.as_mut().ok_or_else(Self::not_open)?;
        port.write_all(bytes).map_err(|e| {
            error!(error = %e, "Serial write error");
            e
        })?;
        port.flush()
    }

    fn bytes_available(&mut self) -> bool {
        match self.port.as_ref().map(|port| port.bytes_to_read()) {
            Some(Ok(count)) => count > 0,
            Some(Err(e)) => {
                warn!(error = %e, "Could not query serial input buffer");
                false
            }
            None => false,
        }
    }

    fn read_byte(&mut self) -> Option<u8> {
        let port = self.port.as_mut()?;
        let mut buf = [0u8; 1];
        match port.read(&mut buf) {
            Ok(1) => Some(buf[0]),
            Ok(_) => None,
            Err(e) if e.kind() == io::ErrorKind::TimedOut => None,
            Err(e) => {
                trace!(error = %e, "Serial read error");
                None
            }
        }
    }

    fn is_busy(&mut self) -> bool {
        // Clear-to-send drops while the radio is keyed up
        match self.port.as_mut().map(|port| port.read_clear_to_send()) {
            Some(Ok(cts)) => !cts,
            _ => false,
        }
    }

    fn last_rssi(&mut self) -> Option<i8> {
        None
    }

    fn describe(&self) -> String {
        format!("serial:{}@{}", self.port_path.display(), self.baud_rate)
    }
}

impl std::fmt::Debug for SerialDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialDriver")
            .field("port", &self.port_path)
            .field("baud_rate", &self.baud_rate)
            .field("open", &self.port.is_some())
            .finish()
    }
}

/// A serial port visible to the flight computer
#[derive(Debug, Clone)]
pub struct PortInfo {
    /// Path to the device (e.g., /dev/ttyUSB0)
    pub path: String,
    /// Device type description
    pub device_type: String,
    /// USB Vendor ID (if available)
    pub vendor_id: Option<u16>,
    /// USB Product ID (if available)
    pub product_id: Option<u16>,
    /// Product name (if available)
    pub product_name: Option<String>,
}

impl PortInfo {
    fn from_serial_port(port: &serialport::SerialPortInfo) -> Self {
        match &port.port_type {
            SerialPortType::UsbPort(usb) => Self {
                path: port.port_name.clone(),
                device_type: "USB".to_string(),
                vendor_id: Some(usb.vid),
                product_id: Some(usb.pid),
                product_name: usb.product.clone(),
            },
            SerialPortType::PciPort => Self::plain(port, "PCI"),
            SerialPortType::BluetoothPort => Self::plain(port, "Bluetooth"),
            SerialPortType::Unknown => Self::plain(port, "Unknown"),
        }
    }

    fn plain(port: &serialport::SerialPortInfo, device_type: &str) -> Self {
        Self {
            path: port.port_name.clone(),
            device_type: device_type.to_string(),
            vendor_id: None,
            product_id: None,
            product_name: None,
        }
    }
}

impl std::fmt::Display for PortInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.path, self.device_type)?;
        if let (Some(vid), Some(pid)) = (self.vendor_id, self.product_id) {
            write!(f, " {vid:04X}:{pid:04X}")?;
        }
        if let Some(product) = &self.product_name {
            write!(f, " {product}")?;
        }
        Ok(())
    }
}

/// List the serial ports radios could be attached to
pub fn list_serial_ports() -> Result<Vec<PortInfo>> {
    let ports = serialport::available_ports()?;
    Ok(ports.iter().map(PortInfo::from_serial_port).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_not_opened_on_construction() {
        let mut driver = SerialDriver::new("/dev/ttyUSB0").with_baud_rate(115200);
        assert!(!driver.is_open());
        assert!(!driver.bytes_available());
        assert_eq!(driver.read_byte(), None);
        assert_eq!(driver.describe(), "serial:/dev/ttyUSB0@115200");
    }

    #[test]
    fn test_write_before_open_fails() {
        let mut driver = SerialDriver::new("/dev/ttyUSB0");
        let err = driver.write(&[0xFA]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotConnected);
    }

    #[test]
    fn test_missing_port_fails_to_initialize() {
        let mut driver = SerialDriver::new("/dev/altair-no-such-port");
        let err = driver.initialize().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
        assert!(!driver.is_open());
    }

    #[test]
    fn test_port_info_display() {
        let info = PortInfo {
            path: "/dev/ttyUSB0".to_string(),
            device_type: "USB".to_string(),
            vendor_id: Some(0x0403),
            product_id: Some(0x6001),
            product_name: Some("FT232R".to_string()),
        };
        assert_eq!(info.to_string(), "/dev/ttyUSB0 (USB) 0403:6001 FT232R");
    }
}
