//! Node configuration file
//!
//! One JSON document with three sections, each optional:
//!
//! ```json
//! {
//!   "logging": { "level": "debug", "format": "compact" },
//!   "instruments": { "required_sensors": ["gps", "orientation"] },
//!   "telemetry": { "telemetry_interval": "5s", "enable_backup2": false }
//! }
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::Path;

use altair_core::{InstrumentConfig, LoggingConfig};
use altair_telemetry::TelemetryConfig;

/// Complete node configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Logging output
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Sensors checked at startup
    #[serde(default)]
    pub instruments: InstrumentConfig,
    /// Radio link
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl NodeConfig {
    /// Read and validate a configuration file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in config file {}", path.display()))
    }

    /// Parse and validate a configuration document
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config: NodeConfig = serde_json::from_str(text)?;
        config.telemetry.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use altair_core::{LogFormat, SensorKind};
    use std::time::Duration;

    #[test]
    fn test_empty_document_uses_defaults() {
        let config = NodeConfig::from_json("{}").unwrap();
        assert!(config.telemetry.backup2_active());
        assert_eq!(config.instruments.required_sensors.len(), SensorKind::ALL.len());
    }

    #[test]
    fn test_sections() {
        let config = NodeConfig::from_json(
            r#"{
                "logging": { "format": "compact" },
                "instruments": { "required_sensors": ["gps"] },
                "telemetry": { "telemetry_interval": "30s", "failover_threshold": 2 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.logging.format, LogFormat::Compact);
        assert!(!config.instruments.requires(SensorKind::LightMonitor));
        assert_eq!(config.telemetry.telemetry_interval, Duration::from_secs(30));
        assert_eq!(config.telemetry.failover_threshold, 2);
    }

    #[test]
    fn test_invalid_values_rejected() {
        let err = NodeConfig::from_json(r#"{ "telemetry": { "failover_threshold": 0 } }"#)
            .unwrap_err();
        assert!(err.to_string().contains("failover_threshold"));
    }

    #[test]
    fn test_missing_file() {
        let err = NodeConfig::load(Path::new("/nonexistent/altair.json")).unwrap_err();
        assert!(err.to_string().contains("altair.json"));
    }
}
