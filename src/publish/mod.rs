//! Downstream delivery of processed records
//!
//! A [`Publisher`] receives the publish projection of every record the
//! pipeline produces. Delivery is fire-and-forget: a failure is logged and
//! counted by the loop, never retried here, and the record stays in history.

mod http;
mod mqtt;

pub use http::HttpPublisher;
pub use mqtt::{MqttPublisher, MqttSession};

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::types::PublishPayload;

/// Sink delivery errors
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("MQTT error: {0}")]
    Mqtt(#[from] rumqttc::ClientError),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server returned status {0}")]
    Status(reqwest::StatusCode),
}

impl PublishError {
    /// Stable reason code for logs and counters.
    pub fn code(&self) -> &'static str {
        "PUBLISH_FAILURE"
    }
}

/// Trait abstracting where processed records go.
#[async_trait]
pub trait Publisher: Send + Sync + 'static {
    async fn publish(&self, payload: &PublishPayload) -> Result<(), PublishError>;

    /// Human-readable name for logging (e.g. "log", "mqtt", "http").
    fn sink_name(&self) -> &str;
}

/// Writes each payload to the log. Used when no downstream is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogPublisher;

#[async_trait]
impl Publisher for LogPublisher {
    async fn publish(&self, payload: &PublishPayload) -> Result<(), PublishError> {
        let body = serde_json::to_string(payload)?;
        info!(target: "emissions_edge::publish", co2e = payload.co2e, "Published {}", body);
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "log"
    }
}
