//! Connectivity-gated, fire-and-forget event publication.

use super::{Transport, TransitionEvent};
use crate::network::NetworkLink;
use log::{error, info, warn};
use std::time::Duration;

/// What happened to one event handed to [`EventPublisher::publish`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The transport accepted and sent the payload.
    Published,
    /// Connected, but the transport reported failure. Event dropped.
    Failed,
    /// No network link; publishing was not attempted. Event dropped.
    Offline,
}

/// Publishes transition events to a single topic.
///
/// Owns the transport outright. Nothing is queued or retried: each call
/// re-checks connectivity and the event is gone once the call returns.
pub struct EventPublisher<T, N> {
    transport: T,
    network: N,
    topic: String,
    connect_retry_delay: Duration,
}

impl<T: Transport, N: NetworkLink> EventPublisher<T, N> {
    pub fn new(
        transport: T,
        network: N,
        topic: impl Into<String>,
        connect_retry_delay: Duration,
    ) -> Self {
        Self {
            transport,
            network,
            topic: topic.into(),
            connect_retry_delay,
        }
    }

    pub fn network(&self) -> &N {
        &self.network
    }

    /// Connect the transport, retrying until the broker accepts.
    ///
    /// Blocks the calling task for as long as the broker is unreachable.
    pub async fn ensure_connected(&mut self) {
        if self.transport.is_connected() {
            return;
        }

        info!("[MQTT] Connecting to {} ...", self.transport.endpoint());
        loop {
            match self.transport.connect().await {
                Ok(()) => {
                    info!("[MQTT] Connected.");
                    return;
                }
                Err(e) => {
                    warn!("[MQTT] Connect failed ({}). Retrying...", e);
                    tokio::time::sleep(self.connect_retry_delay).await;
                }
            }
        }
    }

    /// Attempt to publish `event` once.
    pub async fn publish(&mut self, event: &TransitionEvent) -> PublishOutcome {
        let payload = match event.to_payload() {
            Ok(p) => p,
            Err(e) => {
                error!("[MQTT] Failed to serialize event {:?}: {}", event, e);
                return PublishOutcome::Failed;
            }
        };

        if !self.network.is_available() {
            warn!("[MQTT] Network down, event not sent: {}", payload);
            return PublishOutcome::Offline;
        }

        self.ensure_connected().await;
        self.transport.poll().await;

        if self.transport.publish(&self.topic, &payload).await {
            info!("[MQTT] Published to {}: {}", self.topic, payload);
            PublishOutcome::Published
        } else {
            error!("[MQTT] Failed to publish to {}: {}", self.topic, payload);
            PublishOutcome::Failed
        }
    }
}
