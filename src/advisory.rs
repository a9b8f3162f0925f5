//! Advisory listener: cloud recommendations over MQTT
//!
//! Drives the MQTT event loop for the whole process. Every (re)connect marks
//! the recommendation subscription as pending; the subscribe request is
//! retried on each following event until the client queue accepts it. Each
//! message payload replaces the [`LatestRecommendation`]. Connection errors
//! are logged and retried after a fixed delay until cancellation.

use rumqttc::{AsyncClient, Event, EventLoop, Packet, QoS};
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::defaults::MQTT_RECONNECT_DELAY_SECS;
use crate::pipeline::LatestRecommendation;
use crate::publish::MqttSession;

pub struct AdvisoryListener {
    client: AsyncClient,
    eventloop: EventLoop,
    topic: String,
    subscribe: bool,
    /// Connected but the subscribe request has not been queued yet
    subscribe_pending: bool,
    recommendation: LatestRecommendation,
    reconnect_delay: Duration,
}

impl AdvisoryListener {
    pub fn new(session: MqttSession, recommendation: LatestRecommendation) -> Self {
        let (client, eventloop, topic) = session.into_parts();
        Self {
            client,
            eventloop,
            topic,
            subscribe: true,
            subscribe_pending: false,
            recommendation,
            reconnect_delay: Duration::from_secs(MQTT_RECONNECT_DELAY_SECS),
        }
    }

    /// Only drive outgoing publishes; do not subscribe to recommendations.
    pub fn without_subscription(mut self) -> Self {
        self.subscribe = false;
        self
    }

    /// Poll the connection until cancelled.
    pub async fn run(mut self, cancel_token: CancellationToken) {
        info!(
            topic = %self.topic,
            subscribe = self.subscribe,
            "Advisory listener started"
        );

        loop {
            let polled = tokio::select! {
                _ = cancel_token.cancelled() => break,
                polled = self.eventloop.poll() => polled,
            };

            match polled {
                Ok(event) => {
                    self.handle_event(&event);
                }
                Err(e) => {
                    warn!(error = %e, retry_secs = self.reconnect_delay.as_secs(), "MQTT connection error");
                    tokio::select! {
                        _ = cancel_token.cancelled() => break,
                        _ = tokio::time::sleep(self.reconnect_delay) => {}
                    }
                }
            }
        }

        if let Err(e) = self.client.try_disconnect() {
            debug!(error = %e, "MQTT disconnect request not queued");
        }
        info!("Advisory listener stopped");
    }

    /// Apply one event. Returns true if the recommendation changed.
    pub fn handle_event(&mut self, event: &Event) -> bool {
        let changed = match event {
            Event::Incoming(Packet::ConnAck(_)) => {
                info!("MQTT connected");
                self.subscribe_pending = self.subscribe;
                false
            }
            Event::Incoming(Packet::Publish(p)) if p.topic == self.topic => {
                let text = String::from_utf8_lossy(&p.payload).into_owned();
                info!(recommendation = %text, "Recommendation received");
                self.recommendation.set(text);
                true
            }
            _ => false,
        };

        if self.subscribe_pending {
            self.try_queue_subscription();
        }
        changed
    }

    fn try_queue_subscription(&mut self) {
        match self.client.try_subscribe(self.topic.as_str(), QoS::AtMostOnce) {
            Ok(()) => {
                self.subscribe_pending = false;
                info!(topic = %self.topic, "Subscribed to recommendations");
            }
            // Request queue full of outgoing publishes; retried on the next event.
            Err(e) => debug!(error = %e, topic = %self.topic, "Subscription not queued yet"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::defaults::MQTT_CHANNEL_CAPACITY;
    use crate::config::MqttConfig;
    use crate::publish::Publisher;
    use crate::types::{PublishPayload, TieredReading};
    use rumqttc::{ConnAck, ConnectReturnCode, Publish, Request};

    fn connack() -> Event {
        Event::Incoming(Packet::ConnAck(ConnAck::new(ConnectReturnCode::Success, false)))
    }

    fn queued_subscribes(listener: &AdvisoryListener) -> usize {
        listener
            .eventloop
            .pending
            .iter()
            .filter(|r| matches!(r, Request::Subscribe(_)))
            .count()
    }

    fn listener() -> (AdvisoryListener, LatestRecommendation) {
        let recommendation = LatestRecommendation::default();
        let session = MqttSession::new(&MqttConfig::default());
        (AdvisoryListener::new(session, recommendation.clone()), recommendation)
    }

    #[tokio::test]
    async fn test_recommendation_overwritten_by_message() {
        let (mut listener, recommendation) = listener();

        let first = Publish::new("emissions/recommend", QoS::AtMostOnce, "Reduce venting");
        assert!(listener.handle_event(&Event::Incoming(Packet::Publish(first))));
        assert_eq!(recommendation.get(), "Reduce venting");

        let second = Publish::new("emissions/recommend", QoS::AtMostOnce, "Check flare tip");
        listener.handle_event(&Event::Incoming(Packet::Publish(second)));
        assert_eq!(recommendation.get(), "Check flare tip");
    }

    #[tokio::test]
    async fn test_other_topics_ignored() {
        let (mut listener, recommendation) = listener();
        let msg = Publish::new("emissions/data", QoS::AtMostOnce, "{}");
        assert!(!listener.handle_event(&Event::Incoming(Packet::Publish(msg))));
        assert!(recommendation.is_default());
    }

    #[tokio::test]
    async fn test_stops_on_cancel() {
        let (listener, _) = listener();
        let cancel = CancellationToken::new();
        cancel.cancel();
        tokio::time::timeout(Duration::from_secs(1), listener.run(cancel))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_subscribes_on_connect() {
        let (mut listener, _) = listener();
        listener.handle_event(&connack());
        assert!(!listener.subscribe_pending);

        listener.eventloop.clean();
        assert_eq!(queued_subscribes(&listener), 1);
    }

    #[tokio::test]
    async fn test_no_subscribe_when_disabled() {
        let (listener, _) = listener();
        let mut listener = listener.without_subscription();
        listener.handle_event(&connack());

        listener.eventloop.clean();
        assert_eq!(queued_subscribes(&listener), 0);
    }

    #[tokio::test]
    async fn test_subscription_retried_after_full_queue() {
        let session = MqttSession::new(&MqttConfig::default());
        let publisher = session.publisher();
        let mut listener = AdvisoryListener::new(session, LatestRecommendation::default());

        let payload = PublishPayload {
            time: "2026-01-01T00:00:00+00:00".to_string(),
            co2e: 580.94,
            raw: TieredReading::new(390.0, 1.5, 0.28, 50.0, 20.0),
        };
        for _ in 0..MQTT_CHANNEL_CAPACITY {
            publisher.publish(&payload).await.unwrap();
        }

        // Reconnect while the broker backlog fills the request queue.
        listener.handle_event(&connack());
        assert!(listener.subscribe_pending);

        // Event loop takes the queued publishes, freeing capacity.
        listener.eventloop.clean();
        assert_eq!(queued_subscribes(&listener), 0);

        listener.handle_event(&Event::Incoming(Packet::PingResp));
        assert!(!listener.subscribe_pending);

        listener.eventloop.clean();
        assert_eq!(queued_subscribes(&listener), 1);

        // Queued once only.
        listener.handle_event(&Event::Incoming(Packet::PingResp));
        listener.eventloop.clean();
        assert_eq!(queued_subscribes(&listener), 1);
    }
}
