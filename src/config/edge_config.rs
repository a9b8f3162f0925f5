//! Edge Configuration - pipeline, transport and server settings as TOML values
//!
//! Each section implements `Default` with the values in [`super::defaults`],
//! so a missing file or a partial file behaves exactly like the built-in
//! configuration.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

use super::defaults;

/// Environment variable pointing at an explicit config file.
pub const CONFIG_ENV_VAR: &str = "EMISSIONS_CONFIG";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "edge_config.toml";

// ============================================================================
// Top-Level Config
// ============================================================================

/// Root configuration for one edge deployment.
///
/// Load with [`EdgeConfig::load()`] which searches:
/// 1. `$EMISSIONS_CONFIG`
/// 2. `./edge_config.toml`
/// 3. Built-in defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeConfig {
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Where raw readings come from
    #[serde(default)]
    pub source: SourceConfig,

    /// Where processed records go
    #[serde(default)]
    pub publisher: PublisherConfig,

    /// Broker settings shared by the MQTT publisher and advisory listener
    #[serde(default)]
    pub mqtt: MqttConfig,

    /// Optional historical baseline
    #[serde(default)]
    pub baseline: BaselineConfig,

    /// Reporting API
    #[serde(default)]
    pub server: ServerConfig,
}

impl EdgeConfig {
    /// Load configuration using the standard search order:
    /// 1. `$EMISSIONS_CONFIG` environment variable
    /// 2. `./edge_config.toml` in the current working directory
    /// 3. Built-in defaults
    pub fn load() -> Self {
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            let p = PathBuf::from(&path);
            if p.exists() {
                match Self::load_from_file(&p) {
                    Ok(config) => {
                        info!(path = %p.display(), "Loaded edge config from {}", CONFIG_ENV_VAR);
                        return config;
                    }
                    Err(e) => {
                        warn!(path = %p.display(), error = %e, "Failed to load config from {}, falling back", CONFIG_ENV_VAR);
                    }
                }
            } else {
                warn!(path = %path, "{} points to non-existent file, falling back", CONFIG_ENV_VAR);
            }
        }

        let local = PathBuf::from(LOCAL_CONFIG_FILE);
        if local.exists() {
            match Self::load_from_file(&local) {
                Ok(config) => {
                    info!("Loaded edge config from ./{}", LOCAL_CONFIG_FILE);
                    return config;
                }
                Err(e) => {
                    warn!(error = %e, "Failed to load ./{}, using defaults", LOCAL_CONFIG_FILE);
                }
            }
        }

        info!("No {} found, using built-in defaults", LOCAL_CONFIG_FILE);
        Self::default()
    }

    /// Load from a specific TOML file path.
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(path.to_path_buf(), e))?;
        Self::from_toml_str(&contents).map_err(|e| match e {
            ConfigError::Parse(_, inner) => ConfigError::Parse(path.to_path_buf(), inner),
            other => other,
        })
    }

    /// Parse and validate a TOML document. Unknown keys only warn.
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        for w in super::validation::validate_unknown_keys(contents) {
            warn!("{}", w);
        }

        let config: Self =
            toml::from_str(contents).map_err(|e| ConfigError::Parse(PathBuf::new(), e))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the current config to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(ConfigError::Serialize)
    }

    /// Validate all settings, collecting every problem before failing.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let (errors, warnings) = super::validation::validate_ranges(self);
        for w in &warnings {
            warn!("{}", w);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors))
        }
    }

    /// Tick interval as a `Duration`.
    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.pipeline.tick_interval_secs)
    }
}

// ============================================================================
// Error Type
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config I/O error ({path}): {err}", path = .0.display(), err = .1)]
    Io(PathBuf, std::io::Error),

    #[error("Config parse error ({path}): {err}", path = .0.display(), err = .1)]
    Parse(PathBuf, toml::de::Error),

    #[error("Config serialization error: {0}")]
    Serialize(toml::ser::Error),

    #[error("Config validation failed:\n  - {}", .0.join("\n  - "))]
    Validation(Vec<String>),
}

// ============================================================================
// Pipeline
// ============================================================================

/// Tick cadence and the domain thresholds applied each tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Seconds between ticks
    #[serde(default = "default_tick_interval_secs")]
    pub tick_interval_secs: u64,

    /// Records kept in the rolling history
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// CO2e (kg) strictly above which a record alerts
    #[serde(default = "default_alert_threshold_kg")]
    pub alert_threshold_kg: f64,

    /// Tier 1 CO2 (kg) strictly above which a reading is rejected as anomalous
    #[serde(default = "default_anomaly_ceiling_kg")]
    pub anomaly_ceiling_kg: f64,
}

fn default_tick_interval_secs() -> u64 {
    defaults::TICK_INTERVAL_SECS
}
fn default_history_capacity() -> usize {
    defaults::HISTORY_CAPACITY
}
fn default_alert_threshold_kg() -> f64 {
    defaults::ALERT_THRESHOLD_KG
}
fn default_anomaly_ceiling_kg() -> f64 {
    defaults::ANOMALY_CEILING_KG
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: default_tick_interval_secs(),
            history_capacity: default_history_capacity(),
            alert_threshold_kg: default_alert_threshold_kg(),
            anomaly_ceiling_kg: default_anomaly_ceiling_kg(),
        }
    }
}

// ============================================================================
// Source
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Cycle through the built-in reference readings
    #[default]
    Canned,
    /// Accept one JSON reading per TCP connection
    Tcp,
    /// Read JSON readings from stdin, one per line
    Stdin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    #[serde(default)]
    pub kind: SourceKind,

    /// Listen address used when `kind = "tcp"`
    #[serde(default = "default_tcp_bind")]
    pub tcp_bind: String,
}

fn default_tcp_bind() -> String {
    defaults::TCP_INGEST_ADDR.to_string()
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            kind: SourceKind::default(),
            tcp_bind: default_tcp_bind(),
        }
    }
}

// ============================================================================
// Publisher
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PublisherKind {
    /// Log each payload (no network)
    #[default]
    Log,
    /// Publish to the MQTT data topic
    Mqtt,
    /// POST each payload to an HTTP endpoint
    Http,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublisherConfig {
    #[serde(default)]
    pub kind: PublisherKind,

    /// Webhook URL used when `kind = "http"`
    #[serde(default)]
    pub http_url: String,
}

// ============================================================================
// MQTT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MqttConfig {
    /// Subscribe to cloud recommendations even when not publishing over MQTT
    #[serde(default = "default_true")]
    pub advisories: bool,

    #[serde(default = "default_mqtt_host")]
    pub host: String,

    #[serde(default = "default_mqtt_port")]
    pub port: u16,

    #[serde(default = "default_mqtt_client_id")]
    pub client_id: String,

    /// Topic processed records are published to
    #[serde(default = "default_data_topic")]
    pub data_topic: String,

    /// Topic cloud recommendations arrive on
    #[serde(default = "default_recommend_topic")]
    pub recommend_topic: String,

    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
}

fn default_true() -> bool {
    true
}
fn default_mqtt_host() -> String {
    defaults::MQTT_BROKER_HOST.to_string()
}
fn default_mqtt_port() -> u16 {
    defaults::MQTT_BROKER_PORT
}
fn default_mqtt_client_id() -> String {
    defaults::MQTT_CLIENT_ID.to_string()
}
fn default_data_topic() -> String {
    defaults::MQTT_DATA_TOPIC.to_string()
}
fn default_recommend_topic() -> String {
    defaults::MQTT_RECOMMEND_TOPIC.to_string()
}
fn default_keep_alive_secs() -> u64 {
    defaults::MQTT_KEEP_ALIVE_SECS
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            advisories: true,
            host: default_mqtt_host(),
            port: default_mqtt_port(),
            client_id: default_mqtt_client_id(),
            data_topic: default_data_topic(),
            recommend_topic: default_recommend_topic(),
            keep_alive_secs: default_keep_alive_secs(),
        }
    }
}

// ============================================================================
// Baseline
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BaselineConfig {
    /// CSV of historical Tier 1 observations (columns CO2, CH4, N2O).
    /// Empty disables the baseline; deviations then fall back to raw values.
    #[serde(default)]
    pub csv_path: String,
}

impl BaselineConfig {
    pub fn csv_path(&self) -> Option<&Path> {
        if self.csv_path.trim().is_empty() {
            None
        } else {
            Some(Path::new(&self.csv_path))
        }
    }
}

// ============================================================================
// Server
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// HTTP bind address for the reporting API.
    ///
    /// Can be overridden by `EMISSIONS_SERVER_ADDR` or `--addr`.
    #[serde(default = "default_server_addr")]
    pub addr: String,
}

fn default_server_addr() -> String {
    defaults::SERVER_ADDR.to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_server_addr(),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_validates() {
        let config = EdgeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.pipeline.tick_interval_secs, 5);
        assert_eq!(config.pipeline.history_capacity, 5);
        assert_eq!(config.source.kind, SourceKind::Canned);
        assert_eq!(config.publisher.kind, PublisherKind::Log);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let config = EdgeConfig::from_toml_str(
            r#"
[pipeline]
tick_interval_secs = 1

[source]
kind = "tcp"
"#,
        )
        .unwrap();

        assert_eq!(config.pipeline.tick_interval_secs, 1);
        assert_eq!(config.pipeline.history_capacity, defaults::HISTORY_CAPACITY);
        assert_eq!(config.source.kind, SourceKind::Tcp);
        assert_eq!(config.source.tcp_bind, defaults::TCP_INGEST_ADDR);
        assert_eq!(config.mqtt.recommend_topic, "emissions/recommend");
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = EdgeConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = EdgeConfig::from_toml_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_invalid_values_collected() {
        let err = EdgeConfig::from_toml_str(
            r#"
[pipeline]
tick_interval_secs = 0
history_capacity = 0
"#,
        )
        .unwrap_err();

        match err {
            ConfigError::Validation(errors) => assert_eq!(errors.len(), 2),
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[test]
    fn test_load_from_missing_file_is_io_error() {
        let err = EdgeConfig::load_from_file(Path::new("/nonexistent/edge_config.toml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io(..)));
    }

    #[test]
    fn test_empty_baseline_path_disables_baseline() {
        assert!(BaselineConfig::default().csv_path().is_none());
        let cfg = BaselineConfig {
            csv_path: "historical_ghgp.csv".to_string(),
        };
        assert_eq!(cfg.csv_path(), Some(Path::new("historical_ghgp.csv")));
    }
}
