//! MQTT client wrapper implementing the event transport.

use crate::config::MqttConfig;
use crate::error::{MonitorError, Result};
use crate::publish::Transport;
use async_trait::async_trait;
use log::{debug, trace, warn};
use rumqttc::{
    AsyncClient, ConnectReturnCode, Event, EventLoop, MqttOptions, Outgoing, Packet, QoS,
};
use std::time::Duration;
use tokio::time::timeout;

/// How long `poll()` waits for each pending event before returning.
const POLL_SLICE: Duration = Duration::from_millis(10);
/// Upper bound on events drained by one `poll()` call.
const POLL_MAX_EVENTS: usize = 16;

/// Capacity of the request channel between `AsyncClient` and `EventLoop`.
const REQUEST_CAPACITY: usize = 10;

/// MQTT client for publishing occupancy transitions.
///
/// rumqttc drives the network from its event loop, so every operation here
/// polls the loop itself until the expected packet shows up.
///
/// A failed publish rebuilds the client from the stored options, discarding
/// the queued request so it is never sent after a later reconnect.
pub struct MqttClient {
    options: MqttOptions,
    client: AsyncClient,
    event_loop: EventLoop,
    endpoint: String,
    io_timeout: Duration,
    connected: bool,
}

impl MqttClient {
    /// Create a new MQTT client from configuration. Does not connect.
    pub fn new(config: &MqttConfig) -> Self {
        let mut options =
            MqttOptions::new(&config.client_id, &config.broker_host, config.broker_port);
        options.set_keep_alive(config.keep_alive());

        // Set credentials if provided
        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            options.set_credentials(username, password);
        }

        let (client, event_loop) = AsyncClient::new(options.clone(), REQUEST_CAPACITY);

        Self {
            options,
            client,
            event_loop,
            endpoint: format!("{}:{}", config.broker_host, config.broker_port),
            io_timeout: config.io_timeout(),
            connected: false,
        }
    }

    /// Drop the connection along with any request still queued in it.
    fn reset(&mut self) {
        let (client, event_loop) = AsyncClient::new(self.options.clone(), REQUEST_CAPACITY);
        self.client = client;
        self.event_loop = event_loop;
        self.connected = false;
    }

    fn enqueue(&self, topic: &str, payload: &str) -> Result<()> {
        self.client
            .try_publish(topic, QoS::AtMostOnce, false, payload.as_bytes())?;
        Ok(())
    }

    /// Drive the event loop until the queued publish is written to the socket.
    ///
    /// Only valid with a single request queued: any earlier failure has reset
    /// the loop, so the first outgoing Publish is this one.
    async fn flush_publish(&mut self) -> Result<()> {
        loop {
            match timeout(self.io_timeout, self.event_loop.poll()).await {
                Ok(Ok(Event::Outgoing(Outgoing::Publish(_)))) => return Ok(()),
                Ok(Ok(event)) => trace!("MQTT event while publishing: {:?}", event),
                Ok(Err(e)) => {
                    self.connected = false;
                    return Err(e.into());
                }
                Err(_) => return Err(MonitorError::TransportTimeout(self.io_timeout)),
            }
        }
    }
}

#[async_trait]
impl Transport for MqttClient {
    fn endpoint(&self) -> String {
        self.endpoint.clone()
    }

    async fn connect(&mut self) -> Result<()> {
        loop {
            match timeout(self.io_timeout, self.event_loop.poll()).await {
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    if ack.code == ConnectReturnCode::Success {
                        self.connected = true;
                        return Ok(());
                    }
                    self.connected = false;
                    return Err(MonitorError::ConnectionRefused(format!("{:?}", ack.code)));
                }
                Ok(Ok(event)) => trace!("MQTT event while connecting: {:?}", event),
                Ok(Err(e)) => {
                    self.connected = false;
                    return Err(e.into());
                }
                Err(_) => return Err(MonitorError::TransportTimeout(self.io_timeout)),
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    async fn poll(&mut self) {
        for _ in 0..POLL_MAX_EVENTS {
            match timeout(POLL_SLICE, self.event_loop.poll()).await {
                Ok(Ok(event)) => debug!("MQTT keepalive event: {:?}", event),
                Ok(Err(e)) => {
                    warn!("MQTT connection error: {:?}", e);
                    self.connected = false;
                    break;
                }
                // Nothing pending
                Err(_) => break,
            }
        }
    }

    async fn publish(&mut self, topic: &str, payload: &str) -> bool {
        debug!("Publishing to {}: {}", topic, payload);
        let sent = match self.enqueue(topic, payload) {
            Ok(()) => self.flush_publish().await,
            Err(e) => Err(e),
        };
        match sent {
            Ok(()) => true,
            Err(e) => {
                warn!("MQTT publish not sent, discarding it: {}", e);
                self.reset();
                false
            }
        }
    }
}
