//! MQTT transport for transition events.
//!
//! Publishes to a single topic at QoS 0 with no retained messages and no
//! subscriptions.

mod client;

pub use client::MqttClient;
