//! ALTAIR telemetry link
//!
//! Framing protocol and radio failover for the ALTAIR balloon payload. The
//! payload carries three independent radios; telemetry goes down and
//! commands come up over whichever one currently holds the primary role.
//!
//! # Architecture
//!
//! The link is built in four layers:
//!
//! 1. **Transport** - [`Transport`] capability over the three [`Radio`]s,
//!    each driving chip-level byte primitives through a [`RadioDriver`]
//! 2. **Encoder** - fixed-shape GPS-only and full telemetry frames
//! 3. **Decoder** - [`FrameReader`], the length-prefixed inbound state machine
//! 4. **Failover** - [`TelemetrySystem`], role assignment and promotion
//!
//! # Quick Start
//!
//! ```rust
//! use altair_telemetry::{
//!     Dnt900, LoopbackDriver, Rfm23bp, Shx144, TelemetryConfigBuilder, TelemetrySystem,
//! };
//! use altair_telemetry::test_utils::sample_snapshot;
//!
//! let config = TelemetryConfigBuilder::new().backups(true, true).build();
//! let (dnt900, _) = LoopbackDriver::new();
//! let (shx144, _) = LoopbackDriver::new();
//! let (rfm23bp, _) = LoopbackDriver::new();
//!
//! let mut system = TelemetrySystem::new(
//!     Dnt900::new(Box::new(dnt900), config.radios.dnt900.clone()),
//!     Shx144::new(Box::new(shx144), config.radios.shx144.clone()),
//!     Rfm23bp::new(Box::new(rfm23bp), config.radios.rfm23bp.clone()),
//!     &config,
//! );
//! system.initialize_all(config.enable_backup1, config.enable_backup2)?;
//! system.send_telemetry(&sample_snapshot())?;
//!
//! if system.send_telemetry(&sample_snapshot()).is_err() {
//!     system.promote_backup1()?;
//! }
//! # Ok::<(), altair_telemetry::TelemetryError>(())
//! ```
//!
//! # Features
//!
//! - `serial` - Serial port radio driver (requires `libudev-dev` on Linux)
//!
//! # Wire Format
//!
//! Downlink frames open with `0xFA`, uplink frames with `0xFC`. The next
//! byte is the number of bytes that follow. Downlink frames end with `'T'`,
//! which the length includes. Multi-byte integers are big-endian.

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod config;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod interface;
pub mod system;
pub mod test_utils;

pub use config::{
    Dnt900Config, LinkConfig, RadiosConfig, Rfm23bpConfig, Shx144Config, TelemetryConfig,
    TelemetryConfigBuilder,
};
pub use decoder::{FrameReader, ParsePhase, ReaderRole};
pub use encoder::{
    encode_full_frame, encode_gps_frame, send_full_frame, send_gps_frame, Position,
};
pub use error::{Result, TelemetryError};
pub use interface::{
    Dnt900, DriverPort, LoopbackDriver, LoopbackHandle, Radio, RadioChip, RadioDriver, RadioKind,
    Rfm23bp, Shx144, Transport,
};
pub use system::{LinkStats, RadioHealth, Role, TelemetrySystem};

#[cfg(feature = "serial")]
pub use interface::{list_serial_ports, PortInfo, SerialDriver};

// Protocol constants re-exports
pub use config::{
    CALL_SIGN, END_MESSAGE, FRAME_TERMINATOR, MAX_FRAME_LENGTH, RX_START_BYTE, TX_START_BYTE,
};
pub use encoder::{FULL_FRAME_LENGTH, GPS_FRAME_LENGTH};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
