//! Supervisor tests over configured radios
//!
//! These tests boot the node the way the binary does, with loopback radios
//! and simulated instruments, and drive the schedule with paused time.

use std::path::PathBuf;

use chrono::NaiveTime;
use tokio::time::{Duration, Instant};

use altair_core::{InstrumentConfig, SensorKind, StaticSource};
use altair_node::{LinkSupervisor, NodeConfig, SimulatedInstrument};
use altair_telemetry::{RadioHealth, RadioKind, Role};

fn bench_config() -> NodeConfig {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../config/altair.bench.json");
    NodeConfig::load(&path).unwrap()
}

fn instruments(config: &NodeConfig) -> SimulatedInstrument {
    SimulatedInstrument::new(config.instruments.clone())
        .with_seed(42)
        .with_clock(NaiveTime::from_hms_opt(10, 30, 0).unwrap())
}

// ============================================================================
// Boot
// ============================================================================

#[test]
fn test_boot_brings_up_all_radios() {
    let config = bench_config();
    let link = LinkSupervisor::boot(&config, instruments(&config)).unwrap();

    let system = link.system();
    for kind in RadioKind::ALL {
        assert_eq!(system.health(kind), RadioHealth::Ready);
    }
    assert_eq!(system.role_of(RadioKind::Rfm23bp), Role::Backup2);
}

#[test]
fn test_boot_without_backups() {
    let mut config = bench_config();
    config.telemetry.enable_backup1 = false;
    let link = LinkSupervisor::boot(&config, instruments(&config)).unwrap();

    let system = link.system();
    assert_eq!(system.health(RadioKind::Dnt900), RadioHealth::Ready);
    // Backup 2 follows backup 1
    assert_eq!(system.health(RadioKind::Shx144), RadioHealth::Uninitialized);
    assert_eq!(system.health(RadioKind::Rfm23bp), RadioHealth::Uninitialized);
}

#[test]
fn test_boot_halts_on_missing_sensor() {
    let config = bench_config();
    let source = SimulatedInstrument::new(config.instruments.clone()).without(SensorKind::Gps);
    assert!(LinkSupervisor::boot(&config, source).is_err());
}

#[test]
fn test_optional_sensor_may_be_missing() {
    let config = bench_config();
    let source = instruments(&config).without(SensorKind::MotorController);
    assert!(LinkSupervisor::boot(&config, source).is_ok());
}

#[test]
fn test_boot_halts_on_invalid_radio_settings() {
    let mut config = bench_config();
    config.telemetry.radios.rfm23bp.frequency_mhz = 868.0;
    let err = LinkSupervisor::boot(&config, StaticSource::default()).unwrap_err();
    assert!(format!("{err:#}").contains("RFM23BP"));
}

// ============================================================================
// Schedule
// ============================================================================

#[test]
fn test_first_tick_sends_full_frame() {
    let config = bench_config();
    let mut link = LinkSupervisor::boot(&config, instruments(&config)).unwrap();

    let report = link.tick(Instant::now()).unwrap();
    assert_eq!(report.frames_sent, 1);
    assert_eq!(report.frames_failed, 0);
    assert_eq!(link.source().samples(), 1);
}

#[test]
fn test_instrument_sampled_per_frame() {
    let config = bench_config();
    let mut link = LinkSupervisor::boot(&config, instruments(&config)).unwrap();
    let start = Instant::now();

    for second in 0..5 {
        link.tick(start + Duration::from_secs(second)).unwrap();
    }
    assert_eq!(link.source().samples(), 5);
    assert_eq!(link.system().stats(RadioKind::Dnt900).frames_sent, 5);
}

#[tokio::test(start_paused = true)]
async fn test_run_for_fixed_ticks() {
    let mut config = bench_config();
    config.instruments = InstrumentConfig::default();
    let mut link = LinkSupervisor::boot(&config, instruments(&config)).unwrap();

    link.run(Some(12)).await.unwrap();

    assert_eq!(link.ticks(), 12);
    assert_eq!(link.system().failovers(), 0);
    assert_eq!(link.system().primary_kind(), RadioKind::Dnt900);
}

#[tokio::test(start_paused = true)]
async fn test_ground_station_run() {
    let mut config = bench_config();
    config.telemetry.reader_role = altair_telemetry::ReaderRole::GroundStation;
    let mut link = LinkSupervisor::boot(&config, StaticSource::default()).unwrap();

    link.run(Some(3)).await.unwrap();

    let stats = link.system().stats(RadioKind::Dnt900);
    assert_eq!(stats.frames_sent, 0);
    assert_eq!(stats.empty_reads, 3);
}
