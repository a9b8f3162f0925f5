//! MQTT connection shared by the data publisher and the advisory listener
//!
//! One broker connection carries both directions. The [`MqttSession`] hands
//! out a cloneable [`MqttPublisher`] and gives its event loop to the
//! [`AdvisoryListener`](crate::advisory::AdvisoryListener), which must be
//! running for publishes to leave the process.

use async_trait::async_trait;
use rumqttc::{AsyncClient, EventLoop, MqttOptions, QoS};
use std::time::Duration;

use super::{PublishError, Publisher};
use crate::config::defaults::MQTT_CHANNEL_CAPACITY;
use crate::config::MqttConfig;
use crate::types::PublishPayload;

/// Client handle plus the event loop that drives it.
pub struct MqttSession {
    client: AsyncClient,
    eventloop: EventLoop,
    data_topic: String,
    recommend_topic: String,
}

impl MqttSession {
    /// Prepare a session. No I/O happens until the event loop is polled.
    ///
    /// `config.client_id` must be non-empty (checked by config validation).
    pub fn new(config: &MqttConfig) -> Self {
        let mut options = MqttOptions::new(&config.client_id, &config.host, config.port);
        options.set_keep_alive(Duration::from_secs(config.keep_alive_secs.max(5)));
        let (client, eventloop) = AsyncClient::new(options, MQTT_CHANNEL_CAPACITY);
        Self {
            client,
            eventloop,
            data_topic: config.data_topic.clone(),
            recommend_topic: config.recommend_topic.clone(),
        }
    }

    pub fn publisher(&self) -> MqttPublisher {
        MqttPublisher {
            client: self.client.clone(),
            topic: self.data_topic.clone(),
        }
    }

    pub fn recommend_topic(&self) -> &str {
        &self.recommend_topic
    }

    pub(crate) fn into_parts(self) -> (AsyncClient, EventLoop, String) {
        (self.client, self.eventloop, self.recommend_topic)
    }
}

/// Publishes payloads to the data topic (QoS 1, not retained).
#[derive(Clone)]
pub struct MqttPublisher {
    client: AsyncClient,
    topic: String,
}

#[async_trait]
impl Publisher for MqttPublisher {
    async fn publish(&self, payload: &PublishPayload) -> Result<(), PublishError> {
        let body = serde_json::to_vec(payload)?;
        // Non-blocking: a full request queue (broker unreachable) fails this
        // publish instead of stalling the tick.
        self.client
            .try_publish(self.topic.as_str(), QoS::AtLeastOnce, false, body)?;
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "mqtt"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_publish_fails_fast_when_queue_full() {
        let session = MqttSession::new(&MqttConfig::default());
        let publisher = session.publisher();
        let payload = PublishPayload {
            time: "2026-01-01T00:00:00+00:00".to_string(),
            co2e: 580.94,
            raw: crate::types::TieredReading::new(390.0, 1.5, 0.28, 50.0, 20.0),
        };

        // Event loop never polled: requests queue up until capacity.
        for _ in 0..MQTT_CHANNEL_CAPACITY {
            publisher.publish(&payload).await.unwrap();
        }
        let err = publisher.publish(&payload).await.unwrap_err();
        assert!(matches!(err, PublishError::Mqtt(_)));
        assert_eq!(err.code(), "PUBLISH_FAILURE");
    }

    #[test]
    fn test_session_topics_from_config() {
        let session = MqttSession::new(&MqttConfig::default());
        assert_eq!(session.recommend_topic(), "emissions/recommend");
        assert_eq!(session.publisher().sink_name(), "mqtt");
    }
}
