//! System-wide default constants.
//!
//! Centralises magic numbers shared by the config layer and the pipeline.
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Pipeline
// ============================================================================

/// Interval between pipeline ticks (seconds).
pub const TICK_INTERVAL_SECS: u64 = 5;

/// Rolling history capacity (records).
pub const HISTORY_CAPACITY: usize = 5;

/// CO2e above which a record is flagged as an alert (kg, i.e. one metric ton).
pub const ALERT_THRESHOLD_KG: f64 = 1000.0;

/// Tier 1 CO2 above this is treated as a sensor fault (kg).
///
/// Conservative heuristic, not a physical limit.
pub const ANOMALY_CEILING_KG: f64 = 5000.0;

/// Recommendation text served before any advisory has arrived.
pub const NO_RECOMMENDATION: &str = "No recommendations yet";

// ============================================================================
// Global Warming Potentials (100-year, IPCC AR4)
// ============================================================================

pub const GWP_CO2: f64 = 1.0;
pub const GWP_CH4: f64 = 25.0;
pub const GWP_N2O: f64 = 298.0;

// ============================================================================
// Ingest
// ============================================================================

/// Bind address for the live TCP ingest listener.
pub const TCP_INGEST_ADDR: &str = "0.0.0.0:12345";

/// Largest single JSON reading accepted over TCP (bytes).
pub const TCP_MAX_MESSAGE_BYTES: u64 = 8 * 1024;

/// Time a connected sender has to deliver its reading (seconds).
pub const TCP_READ_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// MQTT
// ============================================================================

pub const MQTT_BROKER_HOST: &str = "broker.hivemq.com";
pub const MQTT_BROKER_PORT: u16 = 1883;
pub const MQTT_CLIENT_ID: &str = "emissions-edge";
pub const MQTT_DATA_TOPIC: &str = "emissions/data";
pub const MQTT_RECOMMEND_TOPIC: &str = "emissions/recommend";
pub const MQTT_KEEP_ALIVE_SECS: u64 = 60;

/// Request channel capacity between the MQTT client handle and its event loop.
pub const MQTT_CHANNEL_CAPACITY: usize = 10;

/// Pause before polling the MQTT event loop again after a connection error (seconds).
pub const MQTT_RECONNECT_DELAY_SECS: u64 = 5;

// ============================================================================
// HTTP publisher
// ============================================================================

/// Request timeout for the HTTP webhook publisher (seconds).
pub const HTTP_PUBLISH_TIMEOUT_SECS: u64 = 10;

// ============================================================================
// Server
// ============================================================================

/// Reporting API bind address (the dashboard's historical port).
pub const SERVER_ADDR: &str = "0.0.0.0:5001";
