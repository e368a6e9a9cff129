//! Inbound frame reader
//!
//! Frames arriving over a radio are a start marker, a length byte, and that
//! many payload bytes; there is no end marker. [`FrameReader`] is the
//! state machine that extracts them from a byte source one byte at a time.
//! Its state persists between calls so a frame may span several reads; keep
//! one reader per radio.

use bytes::{Bytes, BytesMut};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::{
    DEFAULT_MAX_READ_TRIES, MAX_BYTES_PER_READ, MAX_FRAME_LENGTH, RX_START_BYTE, TX_START_BYTE,
};
use crate::error::{Result, TelemetryError};
use crate::interface::Transport;

/// Which direction the reader listens to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderRole {
    /// Ground station reading the payload's downlink (expects 0xFA)
    GroundStation,
    /// Payload reading ground commands (expects 0xFC)
    #[default]
    Onboard,
}

impl ReaderRole {
    /// Pick the role from a ground-station flag
    pub fn from_ground_station(ground_station: bool) -> Self {
        if ground_station {
            ReaderRole::GroundStation
        } else {
            ReaderRole::Onboard
        }
    }

    /// Start marker this role waits for
    pub fn start_byte(self) -> u8 {
        match self {
            ReaderRole::GroundStation => TX_START_BYTE,
            ReaderRole::Onboard => RX_START_BYTE,
        }
    }
}

/// Where the reader is within a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsePhase {
    /// Waiting for the start marker
    AwaitingStart,
    /// Start marker seen, next byte is the length
    AwaitingLength,
    /// Collecting payload bytes
    Accumulating,
}

/// Length-prefixed frame extractor
pub struct FrameReader {
    role: ReaderRole,
    phase: ParsePhase,
    target_len: usize,
    buffer: BytesMut,
    max_read_tries: u32,
}

impl FrameReader {
    /// Create an idle reader
    pub fn new(role: ReaderRole) -> Self {
        Self {
            role,
            phase: ParsePhase::AwaitingStart,
            target_len: 0,
            buffer: BytesMut::with_capacity(MAX_FRAME_LENGTH),
            max_read_tries: DEFAULT_MAX_READ_TRIES,
        }
    }

    /// Set how many empty availability polls a read tolerates
    pub fn with_max_read_tries(mut self, tries: u32) -> Self {
        self.max_read_tries = tries;
        self
    }

    /// Direction this reader listens to
    pub fn role(&self) -> ReaderRole {
        self.role
    }

    /// Current parse phase
    pub fn phase(&self) -> ParsePhase {
        self.phase
    }

    /// Whether no frame is in progress
    pub fn is_idle(&self) -> bool {
        self.phase == ParsePhase::AwaitingStart && self.buffer.is_empty()
    }

    /// Payload bytes collected for the frame in progress
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Drop any frame in progress
    pub fn reset(&mut self) {
        self.phase = ParsePhase::AwaitingStart;
        self.target_len = 0;
        self.buffer.clear();
    }

    /// Advance the state machine by one byte
    ///
    /// Returns the payload once the declared length has been collected; the
    /// reader is idle again afterwards.
    pub fn feed(&mut self, byte: u8) -> Option<Bytes> {
        match self.phase {
            ParsePhase::AwaitingStart => {
                if byte == self.role.start_byte() {
                    self.phase = ParsePhase::AwaitingLength;
                } else {
                    trace!(byte, "Skipping byte outside frame");
                }
                None
            }
            ParsePhase::AwaitingLength => {
                if byte == 0 {
                    warn!("Discarding frame with zero length");
                    self.reset();
                    return None;
                }
                self.target_len = byte as usize;
                self.phase = ParsePhase::Accumulating;
                None
            }
            ParsePhase::Accumulating => {
                self.buffer.extend_from_slice(&[byte]);
                if self.buffer.len() < self.target_len {
                    return None;
                }
                let frame = self.buffer.split().freeze();
                self.reset();
                debug!(length = frame.len(), "Frame complete");
                Some(frame)
            }
        }
    }

    /// Pull bytes from `transport` until a frame completes
    ///
    /// A busy transport is reported at once without reading. Otherwise
    /// `Ok(None)` means the poll budget ran out before a frame completed;
    /// any partial frame is kept for the next call. Bytes after a completed
    /// frame are left in the transport.
    pub fn read_frame<T: Transport + ?Sized>(
        &mut self,
        transport: &mut T,
    ) -> Result<Option<Bytes>> {
        if transport.is_busy() {
            debug!(radio = %transport.name(), "Transport busy, read skipped");
            return Err(TelemetryError::TransportBusy {
                radio: transport.name().to_string(),
            });
        }

        let mut tries = 0;
        let mut consumed = 0;
        while tries < self.max_read_tries && consumed < MAX_BYTES_PER_READ {
            if !transport.available() {
                tries += 1;
                continue;
            }
            match transport.read() {
                Some(byte) => {
                    consumed += 1;
                    if let Some(frame) = self.feed(byte) {
                        return Ok(Some(frame));
                    }
                }
                None => tries += 1,
            }
        }

        trace!(
            radio = %transport.name(),
            consumed,
            phase = ?self.phase,
            "No complete frame"
        );
        Ok(None)
    }
}

impl std::fmt::Debug for FrameReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameReader")
            .field("role", &self.role)
            .field("phase", &self.phase)
            .field("target_len", &self.target_len)
            .field("buffered", &self.buffer.len())
            .finish()
    }
}
