//! Radio transports
//!
//! Every radio on the payload satisfies the [`Transport`] capability. The set
//! of radios is closed, so they are modelled as the [`Radio`] enum rather
//! than open-ended trait objects:
//!
//! - [`dnt900::Dnt900`] - 910 MHz packet radio, antenna at the front of the payload
//! - [`shx144::Shx144`] - 144 MHz serial modem, antenna at the back
//! - [`rfm23bp::Rfm23bp`] - 433 MHz SPI module, antenna on the top side
//!
//! Each radio drives a [`RadioDriver`]: the chip-level byte primitives
//! (UART, SPI, GPIO) that live outside this crate, held in a
//! [`port::DriverPort`]. A radio only supplies its own setup and RSSI rules
//! through [`port::RadioChip`]. Two drivers ship here:
//!
//! - [`loopback::LoopbackDriver`] - in-memory driver for bench tests
//! - [`serial::SerialDriver`] - serial port driver (requires `serial` feature)

pub mod dnt900;
pub mod loopback;
pub mod port;
pub mod rfm23bp;
pub mod shx144;

#[cfg(feature = "serial")]
pub mod serial;

pub use dnt900::Dnt900;
pub use loopback::{LoopbackDriver, LoopbackHandle};
pub use port::{DriverPort, RadioChip};
pub use rfm23bp::Rfm23bp;
pub use shx144::Shx144;

#[cfg(feature = "serial")]
pub use serial::{list_serial_ports, PortInfo, SerialDriver};

use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::io;

use crate::config::{CALL_SIGN, END_MESSAGE, TX_START_BYTE};
use crate::error::Result;

/// Identity of the three fixed radios
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RadioKind {
    /// 910 MHz packet radio
    Dnt900,
    /// 144 MHz serial modem
    Shx144,
    /// 433 MHz SPI module
    Rfm23bp,
}

impl RadioKind {
    /// All radios, in default role order
    pub const ALL: [RadioKind; 3] = [RadioKind::Dnt900, RadioKind::Shx144, RadioKind::Rfm23bp];

    /// Position of this radio in fixed-size per-radio tables
    pub fn index(self) -> usize {
        match self {
            RadioKind::Dnt900 => 0,
            RadioKind::Shx144 => 1,
            RadioKind::Rfm23bp => 2,
        }
    }

    /// Name used in logs and on the wire
    pub fn name(self) -> &'static str {
        match self {
            RadioKind::Dnt900 => "DNT900",
            RadioKind::Shx144 => "SHX144",
            RadioKind::Rfm23bp => "RFM23BP",
        }
    }
}

impl std::fmt::Display for RadioKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Chip-level byte primitives behind a radio
///
/// Implementations talk to the hardware; the radio types layer naming,
/// configuration checks, and error mapping on top.
pub trait RadioDriver: Send {
    /// Bring the hardware to a ready state
    fn initialize(&mut self) -> io::Result<()>;

    /// Hand bytes to the radio for transmission
    fn write(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Whether a received byte is waiting
    fn bytes_available(&mut self) -> bool;

    /// Take one received byte
    fn read_byte(&mut self) -> Option<u8>;

    /// Whether the hardware is mid-transmission or otherwise unable to serve a read
    fn is_busy(&mut self) -> bool;

    /// Signal strength of the last received frame in dBm, if the hardware reports one
    fn last_rssi(&mut self) -> Option<i8>;

    /// Short description for logs
    fn describe(&self) -> String;
}

/// Capability every radio provides to the framing layer
pub trait Transport {
    /// Transmit one byte
    fn send_byte(&mut self, byte: u8) -> Result<()>;

    /// Transmit a byte sequence
    fn send_bytes(&mut self, bytes: &[u8]) -> Result<()>;

    /// Transmit each byte as two uppercase hex digits, for human-readable echoes
    fn send_as_text(&mut self, bytes: &[u8]) -> Result<()> {
        self.send_bytes(hex_text(bytes).as_bytes())
    }

    /// Whether a byte can be read without blocking
    fn available(&mut self) -> bool;

    /// Whether the radio cannot currently serve a read or initialize request
    fn is_busy(&mut self) -> bool;

    /// Bring the radio to a ready state using its configured settings
    ///
    /// Does not retry; a failure is reported to the caller.
    fn initialize(&mut self) -> Result<()>;

    /// Consume one available byte
    ///
    /// Returns `None` when nothing is waiting; callers check
    /// [`available`](Transport::available) first.
    fn read(&mut self) -> Option<u8>;

    /// Radio name
    fn name(&self) -> &str;

    /// Radio identity
    fn kind(&self) -> RadioKind;

    /// RSSI of the most recently received frame in dBm
    ///
    /// Returns [`RSSI_UNAVAILABLE`](altair_core::RSSI_UNAVAILABLE) when unknown.
    fn last_rssi(&mut self) -> i8;

    /// Emit the downlink start marker
    fn send_start(&mut self) -> Result<()> {
        self.send_byte(TX_START_BYTE)
    }

    /// Emit the station call sign
    fn send_call_sign(&mut self) -> Result<()> {
        self.send_bytes(CALL_SIGN.as_bytes())
    }

    /// Emit the sign-off text
    fn send_end_message(&mut self) -> Result<()> {
        self.send_bytes(END_MESSAGE.as_bytes())
    }
}

/// Render bytes as uppercase hex digit pairs
pub(crate) fn hex_text(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        // Writing to a String cannot fail
        let _ = write!(text, "{byte:02X}");
    }
    text
}

/// One of the three payload radios
#[derive(Debug)]
pub enum Radio {
    /// 910 MHz packet radio
    Dnt900(Dnt900),
    /// 144 MHz serial modem
    Shx144(Shx144),
    /// 433 MHz SPI module
    Rfm23bp(Rfm23bp),
}

impl Radio {
    fn inner(&self) -> &dyn Transport {
        match self {
            Radio::Dnt900(radio) => radio as &dyn Transport,
            Radio::Shx144(radio) => radio as &dyn Transport,
            Radio::Rfm23bp(radio) => radio as &dyn Transport,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn Transport {
        match self {
            Radio::Dnt900(radio) => radio as &mut dyn Transport,
            Radio::Shx144(radio) => radio as &mut dyn Transport,
            Radio::Rfm23bp(radio) => radio as &mut dyn Transport,
        }
    }
}

impl From<Dnt900> for Radio {
    fn from(radio: Dnt900) -> Self {
        Radio::Dnt900(radio)
    }
}

impl From<Shx144> for Radio {
    fn from(radio: Shx144) -> Self {
        Radio::Shx144(radio)
    }
}

impl From<Rfm23bp> for Radio {
    fn from(radio: Rfm23bp) -> Self {
        Radio::Rfm23bp(radio)
    }
}

impl Transport for Radio {
    fn send_byte(&mut self, byte: u8) -> Result<()> {
        self.inner_mut().send_byte(byte)
    }

    fn send_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner_mut().send_bytes(bytes)
    }

    fn send_as_text(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner_mut().send_as_text(bytes)
    }

    fn available(&mut self) -> bool {
        self.inner_mut().available()
    }

    fn is_busy(&mut self) -> bool {
        self.inner_mut().is_busy()
    }

    fn initialize(&mut self) -> Result<()> {
        self.inner_mut().initialize()
    }

    fn read(&mut self) -> Option<u8> {
        self.inner_mut().read()
    }

    fn name(&self) -> &str {
        self.inner().name()
    }

    fn kind(&self) -> RadioKind {
        self.inner().kind()
    }

    fn last_rssi(&mut self) -> i8 {
        self.inner_mut().last_rssi()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Dnt900Config, Rfm23bpConfig, Shx144Config};

    #[test]
    fn test_radio_kind_identity() {
        assert_eq!(RadioKind::Dnt900.to_string(), "DNT900");
        assert_eq!(RadioKind::Rfm23bp.name(), "RFM23BP");
        for (i, kind) in RadioKind::ALL.iter().enumerate() {
            assert_eq!(kind.index(), i);
        }
    }

    #[test]
    fn test_hex_text() {
        assert_eq!(hex_text(&[0xFA, 0x0E, 0x01]), "FA0E01");
        assert_eq!(hex_text(&[]), "");
    }

    #[test]
    fn test_radio_dispatch() {
        let (driver, _) = LoopbackDriver::new();
        let radio: Radio = Shx144::new(Box::new(driver), Shx144Config::default()).into();
        assert_eq!(radio.kind(), RadioKind::Shx144);
        assert_eq!(radio.name(), "SHX144");

        let (driver, _) = LoopbackDriver::new();
        let radio: Radio = Rfm23bp::new(Box::new(driver), Rfm23bpConfig::default()).into();
        assert_eq!(radio.kind(), RadioKind::Rfm23bp);
    }

    #[test]
    fn test_protocol_helpers() {
        let (driver, handle) = LoopbackDriver::new();
        let mut radio: Radio = Dnt900::new(Box::new(driver), Dnt900Config::default()).into();

        radio.send_start().unwrap();
        radio.send_call_sign().unwrap();
        radio.send_end_message().unwrap();
        radio.send_as_text(&[0xAB]).unwrap();

        let mut expected = vec![TX_START_BYTE];
        expected.extend_from_slice(CALL_SIGN.as_bytes());
        expected.extend_from_slice(END_MESSAGE.as_bytes());
        expected.extend_from_slice(b"AB");
        assert_eq!(handle.written(), expected);
    }
}
