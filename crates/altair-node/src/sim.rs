//! Simulated instrument package
//!
//! Stands in for the sensor drivers on the bench. Each snapshot advances a
//! steady ascent from the launch site with a little sensor noise.

use chrono::{NaiveTime, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use altair_core::{
    Batteries, CoreError, EnvReading, Environment, GpsFix, InstrumentConfig, LightReadings,
    MotorTelemetry, Orientation, Result, SensorKind, ServoReading, Servos, SnapshotSource,
    StorageUsage, TelemetrySnapshot, RSSI_UNAVAILABLE,
};

const LAUNCH_LATITUDE: f64 = 48.4284;
const LAUNCH_LONGITUDE: f64 = -123.3656;
const LAUNCH_ALTITUDE_M: f64 = 20.0;
const ASCENT_RATE_M_PER_SAMPLE: f64 = 5.0;
const SEA_LEVEL_PA: f32 = 101_325.0;

/// Instrument package that produces plausible flight readings
pub struct SimulatedInstrument {
    config: InstrumentConfig,
    absent: Vec<SensorKind>,
    rng: StdRng,
    samples: u64,
    clock: Option<NaiveTime>,
}

impl SimulatedInstrument {
    /// Create an instrument with every sensor present
    pub fn new(config: InstrumentConfig) -> Self {
        Self {
            config,
            absent: Vec::new(),
            rng: StdRng::from_entropy(),
            samples: 0,
            clock: None,
        }
    }

    /// Use a fixed random seed
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    /// Report a fixed time of day instead of the system clock
    pub fn with_clock(mut self, time: NaiveTime) -> Self {
        self.clock = Some(time);
        self
    }

    /// Leave a sensor unplugged
    pub fn without(mut self, sensor: SensorKind) -> Self {
        self.absent.push(sensor);
        self
    }

    /// Snapshots taken so far
    pub fn samples(&self) -> u64 {
        self.samples
    }

    fn altitude_m(&self) -> f64 {
        LAUNCH_ALTITUDE_M + ASCENT_RATE_M_PER_SAMPLE * self.samples as f64
    }

    fn env_reading(&mut self, pressure_pa: f32, temperature_c: f32, humidity: f32) -> EnvReading {
        EnvReading::new(
            pressure_pa + self.rng.gen_range(-20.0..20.0),
            temperature_c + self.rng.gen_range(-0.5..0.5),
            (humidity + self.rng.gen_range(-1.0..1.0)).clamp(0.0, 100.0),
        )
    }
}

impl SnapshotSource for SimulatedInstrument {
    fn detect(&mut self) -> Result<()> {
        for sensor in SensorKind::ALL {
            if self.config.requires(sensor) && self.absent.contains(&sensor) {
                return Err(CoreError::SensorNotDetected(sensor));
            }
        }
        Ok(())
    }

    fn snapshot(&mut self) -> Result<TelemetrySnapshot> {
        let altitude = self.altitude_m();
        // Barometric approximation, good enough for the lower stratosphere
        let pressure = SEA_LEVEL_PA * (-(altitude as f32) / 7_400.0).exp();
        let outside_c = 15.0 - 0.0065 * altitude as f32;

        let time = self.clock.unwrap_or_else(|| Utc::now().time());
        let logged = self.samples.min(u64::from(u16::MAX)) as u16;
        let gps = if self.absent.contains(&SensorKind::Gps) {
            GpsFix::new(time, 0.0, 0.0, 0.0)
        } else {
            let drift = self.samples as f64 * 1e-5;
            GpsFix::new(time, LAUNCH_LATITUDE + drift, LAUNCH_LONGITUDE - drift, altitude)
                .with_age(self.rng.gen_range(0..1_000))
                .with_hdop(self.rng.gen_range(80..160))
        };

        let snapshot = TelemetrySnapshot {
            gps,
            rssi: RSSI_UNAVAILABLE,
            orientation: Orientation {
                yaw: self.rng.gen_range(-1800..1800),
                pitch: self.rng.gen_range(-50..50),
                roll: self.rng.gen_range(-50..50),
                accel: [0, 0, 981],
                temperature_c: 20,
                sensor_type: 0x05,
                ..Default::default()
            },
            batteries: Batteries {
                general_ops_v: 12.1 - 0.0005 * self.samples as f32,
                propulsion_v: 12.4 - 0.001 * self.samples as f32,
            },
            environment: Environment {
                outside: self.env_reading(pressure, outside_c, 40.0),
                internal: self.env_reading(pressure + 400.0, 18.0, 20.0),
                balloon: self.env_reading(pressure, outside_c - 2.0, 40.0),
            },
            motors: MotorTelemetry {
                packed_rpm: [0; 4],
                packed_current: [0; 4],
                packed_temperature: [25; 8],
                power: [0.0; 4],
            },
            servos: Servos {
                axle_rotation: ServoReading {
                    setting: 1.5,
                    position_v: 2.5,
                },
                bleed_valve: ServoReading::default(),
                cutdown: ServoReading::default(),
            },
            storage: StorageUsage {
                occupied: logged,
                free: u16::MAX - logged,
            },
            light: LightReadings {
                status: 0x01,
                photodiodes: [
                    self.rng.gen_range(400..600),
                    self.rng.gen_range(400..600),
                    self.rng.gen_range(0..20),
                ],
                differential_12: self.rng.gen_range(-30..30),
            },
        };

        self.samples += 1;
        Ok(snapshot)
    }
}

impl std::fmt::Debug for SimulatedInstrument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedInstrument")
            .field("absent", &self.absent)
            .field("samples", &self.samples)
            .finish()
    }
}
