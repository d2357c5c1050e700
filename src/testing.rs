//! Scriptable collaborators shared by the unit tests.

use crate::error::{MonitorError, Result};
use crate::network::{NetworkLink, TimeSource};
use crate::publish::{Timestamp, Transport};
use crate::sensors::ProximitySensor;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

#[derive(Default)]
struct TransportLog {
    connected: bool,
    connect_failures_left: u32,
    reject_publishes: bool,
    connect_attempts: u32,
    polls: u32,
    publish_attempts: u32,
    published: Vec<(String, String)>,
}

/// Transport that records every call. Clones share the same log.
#[derive(Clone, Default)]
pub struct RecordingTransport {
    log: Arc<Mutex<TransportLog>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the first `n` connect attempts.
    pub fn failing_connects(self, n: u32) -> Self {
        self.log.lock().connect_failures_left = n;
        self
    }

    /// Make every publish report failure.
    pub fn rejecting_publishes(self) -> Self {
        self.log.lock().reject_publishes = true;
        self
    }

    pub fn connect_attempts(&self) -> u32 {
        self.log.lock().connect_attempts
    }

    pub fn polls(&self) -> u32 {
        self.log.lock().polls
    }

    pub fn publish_attempts(&self) -> u32 {
        self.log.lock().publish_attempts
    }

    pub fn published(&self) -> Vec<(String, String)> {
        self.log.lock().published.clone()
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    fn endpoint(&self) -> String {
        "recording:1883".to_string()
    }

    async fn connect(&mut self) -> Result<()> {
        let mut log = self.log.lock();
        log.connect_attempts += 1;
        if log.connect_failures_left > 0 {
            log.connect_failures_left -= 1;
            return Err(MonitorError::ConnectionRefused("ServiceUnavailable".to_string()));
        }
        log.connected = true;
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.log.lock().connected
    }

    async fn poll(&mut self) {
        self.log.lock().polls += 1;
    }

    async fn publish(&mut self, topic: &str, payload: &str) -> bool {
        let mut log = self.log.lock();
        log.publish_attempts += 1;
        if log.reject_publishes {
            return false;
        }
        log.published.push((topic.to_string(), payload.to_string()));
        true
    }
}

/// Network link whose availability the test flips at will.
#[derive(Clone)]
pub struct SwitchableLink {
    up: Arc<AtomicBool>,
}

impl SwitchableLink {
    pub fn new(up: bool) -> Self {
        Self {
            up: Arc::new(AtomicBool::new(up)),
        }
    }

    pub fn set(&self, up: bool) {
        self.up.store(up, Ordering::SeqCst);
    }
}

impl NetworkLink for SwitchableLink {
    fn is_available(&self) -> bool {
        self.up.load(Ordering::SeqCst)
    }
}

/// Clock that always reports the same timestamp.
pub struct FixedClock(pub Timestamp);

impl TimeSource for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

/// Sensor whose next reading is set by the test. Clones share the value.
#[derive(Clone)]
pub struct ScriptedSensor {
    value: Arc<Mutex<Option<i32>>>,
}

impl ScriptedSensor {
    pub fn new(value: i32) -> Self {
        Self {
            value: Arc::new(Mutex::new(Some(value))),
        }
    }

    pub fn set(&self, value: i32) {
        *self.value.lock() = Some(value);
    }

    /// Make subsequent reads fail until the next `set`.
    pub fn fail(&self) {
        *self.value.lock() = None;
    }
}

impl ProximitySensor for ScriptedSensor {
    fn read_raw(&mut self) -> Result<i32> {
        let value = *self.value.lock();
        value.ok_or_else(|| MonitorError::SensorRead("scripted failure".to_string()))
    }
}
