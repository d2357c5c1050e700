//! Parking space monitor library.
//!
//! Samples a proximity sensor, drives a local occupancy indicator and
//! publishes occupancy transitions over MQTT.

pub mod config;
pub mod error;
pub mod monitor;
pub mod mqtt;
pub mod network;
pub mod publish;
pub mod sensors;
pub mod state;
pub mod tasks;

#[cfg(test)]
mod testing;
