//! Downlink frame encoder
//!
//! Two fixed-shape frames go down to the ground station:
//!
//! ```text
//! GPS-only:  FA 0E | position (13)                        | 'T'
//! Full:      FA 47 | position (13) | telemetry body (57)  | 'T'
//! ```
//!
//! The length byte counts every byte after itself, terminator included.
//! Multi-byte integers are big-endian and every quantisation truncates;
//! ground decoders depend on both. Scaled readings are truncated to `i32`
//! and then keep their low bits, so out-of-range values wrap the same way
//! elevation does.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use chrono::{NaiveTime, Timelike};
use tracing::{debug, warn};

use crate::config::{FRAME_TERMINATOR, TX_START_BYTE};
use crate::error::Result;
use crate::interface::Transport;
use altair_core::{GpsFix, TelemetrySnapshot, GPS_AGE_NEVER};

/// Bytes in the shared positional block
pub const POSITION_LENGTH: usize = 3 + 4 + 4 + 2;

/// Bytes following the positional block in a full frame
pub const TELEMETRY_BODY_LENGTH: usize = 2 // fix age
    + 1 // hdop
    + 1 // rssi
    + 2 // batteries
    + 3 * 4 // environment triples
    + 4 + 4 + 8 // packed motor arrays
    + 2 + 2 // storage
    + 4 // motor power
    + 3 * 2 // servos
    + 1 // light status
    + 3 * 2 // photodiodes
    + 2; // differential

/// Length byte of the GPS-only frame
pub const GPS_FRAME_LENGTH: u8 = 0x0E;

/// Length byte of the full telemetry frame
pub const FULL_FRAME_LENGTH: u8 = 0x47;

const _: () = assert!(GPS_FRAME_LENGTH as usize == POSITION_LENGTH + 1);
const _: () =
    assert!(FULL_FRAME_LENGTH as usize == POSITION_LENGTH + TELEMETRY_BODY_LENGTH + 1);

/// Time and position in wire units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// UTC hour
    pub hour: u8,
    /// UTC minute
    pub minute: u8,
    /// UTC second
    pub second: u8,
    /// Latitude in millionths of a degree
    pub latitude_e6: i32,
    /// Longitude in millionths of a degree
    pub longitude_e6: i32,
    /// Elevation in meters, wrapping above 32767
    pub elevation_m: i16,
}

impl Position {
    /// Convert time, degrees, and meters to wire units
    pub fn new(time: NaiveTime, latitude: f64, longitude: f64, elevation_m: f64) -> Self {
        Self {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
            second: time.second() as u8,
            latitude_e6: (latitude * 1_000_000.0) as i32,
            longitude_e6: (longitude * 1_000_000.0) as i32,
            // Saturate to i32 first, then keep the low 16 bits
            elevation_m: (elevation_m as i32) as i16,
        }
    }

    /// Position block of a GPS fix
    pub fn from_fix(fix: &GpsFix) -> Self {
        Self::new(fix.time, fix.latitude, fix.longitude, fix.altitude_m)
    }

    /// Latitude in degrees
    pub fn latitude(&self) -> f64 {
        f64::from(self.latitude_e6) / 1_000_000.0
    }

    /// Longitude in degrees
    pub fn longitude(&self) -> f64 {
        f64::from(self.longitude_e6) / 1_000_000.0
    }

    fn put(&self, buf: &mut BytesMut) {
        buf.put_u8(self.hour);
        buf.put_u8(self.minute);
        buf.put_u8(self.second);
        buf.put_i32(self.latitude_e6);
        buf.put_i32(self.longitude_e6);
        buf.put_i16(self.elevation_m);
    }

    /// Parse the positional block at the start of a received payload
    pub fn decode(mut payload: &[u8]) -> Option<Self> {
        if payload.len() < POSITION_LENGTH {
            return None;
        }
        Some(Self {
            hour: payload.get_u8(),
            minute: payload.get_u8(),
            second: payload.get_u8(),
            latitude_e6: payload.get_i32(),
            longitude_e6: payload.get_i32(),
            elevation_m: payload.get_i16(),
        })
    }
}

/// Truncate to an integer, then keep the low byte
fn wrap_u8(value: f32) -> u8 {
    value as i32 as u8
}

fn wrap_i8(value: f32) -> i8 {
    value as i32 as i8
}

fn wrap_u16(value: f32) -> u16 {
    value as i32 as u16
}

fn frame_header(length: u8) -> BytesMut {
    let mut buf = BytesMut::with_capacity(length as usize + 2);
    buf.put_u8(TX_START_BYTE);
    buf.put_u8(length);
    buf
}

/// Build a GPS-only frame
pub fn encode_gps_frame(position: &Position) -> Bytes {
    let mut buf = frame_header(GPS_FRAME_LENGTH);
    position.put(&mut buf);
    buf.put_u8(FRAME_TERMINATOR);
    buf.freeze()
}

/// Build a full telemetry frame
pub fn encode_full_frame(snapshot: &TelemetrySnapshot) -> Bytes {
    let mut buf = frame_header(FULL_FRAME_LENGTH);
    Position::from_fix(&snapshot.gps).put(&mut buf);

    let age = match snapshot.gps.age_ms {
        // Real ages stay below the never-updated marker
        Some(ms) => ms.min(u32::from(GPS_AGE_NEVER - 1)) as u16,
        None => GPS_AGE_NEVER,
    };
    buf.put_u16(age);
    buf.put_u8(snapshot.gps.hdop as u8);
    buf.put_u8(snapshot.rssi as u8);

    buf.put_u8(wrap_u8(snapshot.batteries.general_ops_v * 20.0));
    buf.put_u8(wrap_u8(snapshot.batteries.propulsion_v * 20.0));

    let env = &snapshot.environment;
    for reading in [&env.outside, &env.internal, &env.balloon] {
        buf.put_u16(wrap_u16(reading.pressure_pa / 2.0));
        buf.put_i8(wrap_i8(reading.temperature_c));
        buf.put_u8(wrap_u8(reading.humidity_pct));
    }

    let motors = &snapshot.motors;
    buf.put_slice(&motors.packed_rpm);
    buf.put_slice(&motors.packed_current);
    buf.put_slice(&motors.packed_temperature);

    buf.put_u16(snapshot.storage.occupied);
    buf.put_u16(snapshot.storage.free);

    for power in motors.power {
        buf.put_u8(wrap_u8(power * 10.0));
    }

    let servos = &snapshot.servos;
    for servo in [&servos.axle_rotation, &servos.bleed_valve, &servos.cutdown] {
        buf.put_u8(wrap_u8(servo.setting * 10.0));
        buf.put_u8(wrap_u8(servo.position_v * 50.0));
    }

    let light = &snapshot.light;
    buf.put_u8(light.status);
    for photodiode in light.photodiodes {
        buf.put_u16(photodiode);
    }
    buf.put_i16(light.differential_12);

    buf.put_u8(FRAME_TERMINATOR);
    buf.freeze()
}

/// Outcome of pushing one frame through a transport
#[derive(Debug)]
pub(crate) struct Transmission {
    /// Failed writes before the terminator
    pub early_failures: u32,
    /// Result of writing the terminator
    pub result: Result<()>,
}

/// Write a frame best-effort: a failed write never stops the rest of the frame
///
/// `frame` is an encoded downlink frame; its start marker goes out through
/// [`Transport::send_start`], then the length and payload, then the
/// terminator.
pub(crate) fn transmit<T: Transport + ?Sized>(transport: &mut T, frame: &[u8]) -> Transmission {
    let Some((terminator, body)) = frame.split_last() else {
        return Transmission {
            early_failures: 0,
            result: Ok(()),
        };
    };
    debug_assert_eq!(body.first(), Some(&TX_START_BYTE));

    let mut early_failures = 0;
    let start = transport.send_start();
    let payload = match body.get(1..) {
        Some(rest) if !rest.is_empty() => transport.send_bytes(rest),
        _ => Ok(()),
    };
    for result in [start, payload] {
        if let Err(e) = result {
            warn!(radio = %transport.name(), error = %e, "Frame write failed, continuing");
            early_failures += 1;
        }
    }

    let result = transport.send_byte(*terminator);
    debug!(
        radio = %transport.name(),
        length = frame.len(),
        early_failures,
        ok = result.is_ok(),
        "Frame sent"
    );
    Transmission {
        early_failures,
        result,
    }
}

/// Encode and send a GPS-only frame
///
/// Only the terminator's write result is returned; earlier write failures
/// are logged.
pub fn send_gps_frame<T: Transport + ?Sized>(
    transport: &mut T,
    position: &Position,
) -> Result<()> {
    transmit(transport, &encode_gps_frame(position)).result
}

/// Encode and send a full telemetry frame
///
/// Only the terminator's write result is returned; earlier write failures
/// are logged.
pub fn send_full_frame<T: Transport + ?Sized>(
    transport: &mut T,
    snapshot: &TelemetrySnapshot,
) -> Result<()> {
    transmit(transport, &encode_full_frame(snapshot)).result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{sample_snapshot, MockTransport};
    use altair_core::{Batteries, EnvReading, GpsFix};

    fn victoria() -> Position {
        let time = NaiveTime::from_hms_opt(14, 5, 30).unwrap();
        Position::new(time, 48.4284, -123.3656, 1200.0)
    }

    #[test]
    fn test_gps_frame_layout() {
        let frame = encode_gps_frame(&victoria());

        assert_eq!(frame.len(), GPS_FRAME_LENGTH as usize + 2);
        assert_eq!(frame[0], TX_START_BYTE);
        assert_eq!(frame[1], 0x0E);
        assert_eq!(&frame[2..5], &[14, 5, 30]);
        assert_eq!(i32::from_be_bytes(frame[5..9].try_into().unwrap()), 48428400);
        assert_eq!(
            i32::from_be_bytes(frame[9..13].try_into().unwrap()),
            -123365600
        );
        assert_eq!(i16::from_be_bytes(frame[13..15].try_into().unwrap()), 1200);
        assert_eq!(frame[15], FRAME_TERMINATOR);
    }

    #[test]
    fn test_full_frame_declared_length_matches() {
        let frame = encode_full_frame(&sample_snapshot());
        assert_eq!(frame[1], FULL_FRAME_LENGTH);
        assert_eq!(frame.len() - 2, FULL_FRAME_LENGTH as usize);
        assert_eq!(frame.last(), Some(&FRAME_TERMINATOR));
    }

    #[test]
    fn test_battery_truncates() {
        let mut snapshot = TelemetrySnapshot::default();
        snapshot.batteries = Batteries {
            general_ops_v: 11.95,
            propulsion_v: 12.77,
        };
        let frame = encode_full_frame(&snapshot);

        // start, length, position, age, hdop, rssi
        let offset = 2 + POSITION_LENGTH + 4;
        assert_eq!(frame[offset], 239);
        assert_eq!(frame[offset + 1], 255);
    }

    #[test]
    fn test_out_of_range_readings_wrap() {
        let mut snapshot = TelemetrySnapshot::default();
        snapshot.batteries.propulsion_v = 13.0;
        snapshot.environment.outside = EnvReading::new(140_000.0, -130.0, 101.0);
        snapshot.motors.power = [-0.1, 26.0, 0.0, 0.0];
        let frame = encode_full_frame(&snapshot);

        let body = &frame[2 + POSITION_LENGTH..];
        // 13.0 V * 20 = 260
        assert_eq!(body[5], 4);
        // 70000 keeps its low 16 bits
        assert_eq!(u16::from_be_bytes([body[6], body[7]]), 70_000u32 as u16);
        assert_eq!(body[8] as i8, -130i32 as i8);
        assert_eq!(body[9], 101);
        assert_eq!(&body[38..40], &[255, 4]);
    }

    #[test]
    fn test_elevation_wraps() {
        let time = NaiveTime::from_hms_opt(0, 0, 0).unwrap();
        let position = Position::new(time, 0.0, 0.0, 33_000.0);
        assert_eq!(position.elevation_m, 33_000i32 as i16);
        assert!(position.elevation_m < 0);

        let position = Position::new(time, 0.0, 0.0, -12.7);
        assert_eq!(position.elevation_m, -12);
    }

    #[test]
    fn test_fix_age_sentinel() {
        let mut snapshot = TelemetrySnapshot::default();
        let age_at = 2 + POSITION_LENGTH;

        let frame = encode_full_frame(&snapshot);
        assert_eq!(&frame[age_at..age_at + 2], &[0xFF, 0xFF]);

        snapshot.gps = GpsFix::default().with_age(1500);
        let frame = encode_full_frame(&snapshot);
        assert_eq!(&frame[age_at..age_at + 2], &1500u16.to_be_bytes());

        snapshot.gps = GpsFix::default().with_age(10_000_000);
        let frame = encode_full_frame(&snapshot);
        assert_eq!(&frame[age_at..age_at + 2], &[0xFF, 0xFE]);
    }

    #[test]
    fn test_position_decode() {
        let frame = encode_gps_frame(&victoria());
        let decoded = Position::decode(&frame[2..]).unwrap();
        assert_eq!(decoded, victoria());
        assert!((decoded.latitude() - 48.4284).abs() < 1e-6);
        assert!(Position::decode(&frame[2..10]).is_none());
    }

    #[test]
    fn test_send_continues_after_failure() {
        let mut transport = MockTransport::new();
        transport.fail_next_writes(1);

        let outcome = transmit(&mut transport, &encode_gps_frame(&victoria()));
        assert_eq!(outcome.early_failures, 1);
        assert!(outcome.result.is_ok());
        // Length, payload and terminator still went out
        assert_eq!(transport.sent().len(), GPS_FRAME_LENGTH as usize + 1);
        assert_eq!(transport.sent()[0], GPS_FRAME_LENGTH);
    }

    #[test]
    fn test_frame_opens_with_send_start() {
        let mut transport = MockTransport::new();
        send_gps_frame(&mut transport, &victoria()).unwrap();

        let sent = transport.sent().to_vec();
        assert_eq!(sent, encode_gps_frame(&victoria()).to_vec());
        assert_eq!(sent[0], TX_START_BYTE);
    }

    #[test]
    fn test_send_reports_terminator_failure() {
        let mut transport = MockTransport::new();
        transport.set_fail_writes(true);

        assert!(send_full_frame(&mut transport, &sample_snapshot()).is_err());
    }
}
