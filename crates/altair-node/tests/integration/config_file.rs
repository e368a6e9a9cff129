//! Configuration file tests
//!
//! These tests load the shipped configuration files.

use std::path::PathBuf;
use std::time::Duration;

use altair_core::{LogFormat, LogLevel, SensorKind};
use altair_node::NodeConfig;
use altair_telemetry::{LinkConfig, ReaderRole};

fn config_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../config")
        .join(name)
}

// ============================================================================
// Shipped Files
// ============================================================================

#[test]
fn test_flight_config_loads() {
    let config = NodeConfig::load(&config_path("altair.flight.json")).unwrap();

    assert_eq!(config.logging.format, LogFormat::Compact);
    assert!(config.logging.log_file.is_some());
    assert_eq!(config.instruments.required_sensors.len(), SensorKind::ALL.len());
    assert_eq!(config.telemetry.reader_role, ReaderRole::Onboard);
    assert_eq!(config.telemetry.call_sign_interval, Duration::from_secs(600));
    assert_eq!(
        config.telemetry.radios.shx144.link,
        LinkConfig::Serial {
            port: PathBuf::from("/dev/ttyUSB0"),
            baud_rate: 9600,
        }
    );
}

#[test]
fn test_bench_config_loads() {
    let config = NodeConfig::load(&config_path("altair.bench.json")).unwrap();

    assert_eq!(config.logging.level, LogLevel::Debug);
    assert!(!config.instruments.requires(SensorKind::LightMonitor));
    assert_eq!(config.telemetry.failover_threshold, 2);
    assert_eq!(
        config.telemetry.radios.dnt900.link,
        LinkConfig::Loopback { echo: true }
    );
}

// ============================================================================
// Invalid Documents
// ============================================================================

#[test]
fn test_zero_interval_rejected() {
    let err = NodeConfig::from_json(r#"{ "telemetry": { "gps_interval": "0s" } }"#).unwrap_err();
    assert!(err.to_string().contains("gps_interval"));
}

#[test]
fn test_unknown_link_type_rejected() {
    let json = r#"{
        "telemetry": { "radios": { "dnt900": { "link": { "type": "spi" } } } }
    }"#;
    assert!(NodeConfig::from_json(json).is_err());
}

#[test]
fn test_bad_duration_rejected() {
    let json = r#"{ "telemetry": { "telemetry_interval": "soon" } }"#;
    assert!(NodeConfig::from_json(json).is_err());
}
