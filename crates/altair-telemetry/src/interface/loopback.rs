//! In-memory radio driver
//!
//! [`LoopbackDriver`] stands in for radio hardware on the bench and in tests.
//! A cloneable [`LoopbackHandle`] shares its state, so bytes can be queued
//! for reception and transmitted bytes inspected after the driver has been
//! moved into a radio.
//!
//! Transmitted bytes are only kept while a handle is alive to inspect them,
//! and echoed bytes queue up to [`ECHO_CAPACITY`], like a full UART receive
//! buffer dropping overflow.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::io;
use std::sync::Arc;

use crate::interface::RadioDriver;

/// Echoed bytes held for reading before further echoes are dropped
pub const ECHO_CAPACITY: usize = 4096;

#[derive(Debug, Default)]
struct LoopbackState {
    written: Vec<u8>,
    incoming: VecDeque<u8>,
    echo: bool,
    busy: bool,
    fail_writes: bool,
    fail_init: bool,
    init_count: u32,
    rssi: Option<i8>,
}

/// Radio driver backed by in-memory queues
#[derive(Debug)]
pub struct LoopbackDriver {
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackDriver {
    /// Create a driver and the handle that controls it
    pub fn new() -> (Self, LoopbackHandle) {
        let state = Arc::new(Mutex::new(LoopbackState::default()));
        (
            Self {
                state: state.clone(),
            },
            LoopbackHandle { state },
        )
    }

    /// Create a driver that feeds every transmitted byte back to its receive side
    pub fn echo() -> (Self, LoopbackHandle) {
        let (driver, handle) = Self::new();
        handle.state.lock().echo = true;
        (driver, handle)
    }
}

impl RadioDriver for LoopbackDriver {
    fn initialize(&mut self) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.fail_init {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "radio did not answer",
            ));
        }
        state.init_count += 1;
        Ok(())
    }

    fn write(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.fail_writes {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "transmit failed"));
        }
        if Arc::strong_count(&self.state) > 1 {
            state.written.extend_from_slice(bytes);
        }
        if state.echo {
            let room = ECHO_CAPACITY.saturating_sub(state.incoming.len());
            state.incoming.extend(bytes.iter().copied().take(room));
        }
        Ok(())
    }

    fn bytes_available(&mut self) -> bool {
        !self.state.lock().incoming.is_empty()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.state.lock().incoming.pop_front()
    }

    fn is_busy(&mut self) -> bool {
        self.state.lock().busy
    }

    fn last_rssi(&mut self) -> Option<i8> {
        self.state.lock().rssi
    }

    fn describe(&self) -> String {
        if self.state.lock().echo {
            "loopback(echo)".to_string()
        } else {
            "loopback".to_string()
        }
    }
}

/// Control and inspection handle for a [`LoopbackDriver`]
#[derive(Debug, Clone)]
pub struct LoopbackHandle {
    state: Arc<Mutex<LoopbackState>>,
}

impl LoopbackHandle {
    /// Queue bytes for the radio to receive
    pub fn queue_incoming(&self, bytes: &[u8]) {
        self.state.lock().incoming.extend(bytes.iter().copied());
    }

    /// Number of received bytes not yet read
    pub fn pending_incoming(&self) -> usize {
        self.state.lock().incoming.len()
    }

    /// Every byte transmitted so far
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().written.clone()
    }

    /// Take and clear the transmitted bytes
    pub fn take_written(&self) -> Vec<u8> {
        std::mem::take(&mut self.state.lock().written)
    }

    /// Simulate the busy line
    pub fn set_busy(&self, busy: bool) {
        self.state.lock().busy = busy;
    }

    /// Make every write fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Make initialization fail
    pub fn set_fail_init(&self, fail: bool) {
        self.state.lock().fail_init = fail;
    }

    /// Number of successful initializations
    pub fn init_count(&self) -> u32 {
        self.state.lock().init_count
    }

    /// Set the RSSI the driver reports
    pub fn set_rssi(&self, rssi: Option<i8>) {
        self.state.lock().rssi = rssi;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queue_and_read() {
        let (mut driver, handle) = LoopbackDriver::new();
        assert!(!driver.bytes_available());

        handle.queue_incoming(&[1, 2]);
        assert!(driver.bytes_available());
        assert_eq!(driver.read_byte(), Some(1));
        assert_eq!(driver.read_byte(), Some(2));
        assert_eq!(driver.read_byte(), None);
    }

    #[test]
    fn test_echo() {
        let (mut driver, handle) = LoopbackDriver::echo();
        driver.write(&[0xFA, 0x01]).unwrap();

        assert_eq!(handle.written(), vec![0xFA, 0x01]);
        assert_eq!(handle.pending_incoming(), 2);
        assert_eq!(driver.describe(), "loopback(echo)");
    }

    #[test]
    fn test_simulated_failures() {
        let (mut driver, handle) = LoopbackDriver::new();
        handle.set_fail_writes(true);
        handle.set_fail_init(true);

        assert!(driver.write(&[0]).is_err());
        assert!(driver.initialize().is_err());
        assert_eq!(handle.init_count(), 0);
        assert!(handle.written().is_empty());
    }

    #[test]
    fn test_nothing_retained_without_handle() {
        let (mut driver, handle) = LoopbackDriver::new();
        drop(handle);

        for _ in 0..10_000 {
            driver.write(&[0u8; 73]).unwrap();
        }
        assert!(driver.state.lock().written.is_empty());
    }

    #[test]
    fn test_written_kept_while_any_handle_lives() {
        let (mut driver, handle) = LoopbackDriver::new();
        let clone = handle.clone();
        drop(handle);

        driver.write(&[1, 2, 3]).unwrap();
        assert_eq!(clone.written(), vec![1, 2, 3]);
    }

    #[test]
    fn test_unread_echo_bounded() {
        let (mut driver, handle) = LoopbackDriver::echo();
        drop(handle);

        for _ in 0..1_000 {
            driver.write(&[0xFA; 73]).unwrap();
        }
        assert_eq!(driver.state.lock().incoming.len(), ECHO_CAPACITY);
        assert!(driver.bytes_available());
    }

    #[test]
    fn test_take_written() {
        let (mut driver, handle) = LoopbackDriver::new();
        driver.write(b"abc").unwrap();
        assert_eq!(handle.take_written(), b"abc".to_vec());
        assert!(handle.written().is_empty());
    }
}
