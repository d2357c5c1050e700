//! Simulated hardware for development without a sensor attached.
//!
//! The sensor alternates between a "car present" and "space empty" reading
//! every dwell period, with a little jitter so the log looks like a real ADC.

use super::{Indicator, Occupancy, ProximitySensor};
use crate::error::Result;
use log::info;
use parking_lot::RwLock;
use rand::Rng;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Typical reading with a car parked over the sensor.
const OCCUPIED_LEVEL: i32 = 900;
/// Typical reading over an empty space (12-bit ADC near full scale).
const FREE_LEVEL: i32 = 4000;
const JITTER: i32 = 60;

/// Proximity sensor that flips between occupied and free on a fixed dwell.
pub struct SimulatedSensor {
    dwell: Duration,
    started: Instant,
}

impl SimulatedSensor {
    pub fn new(dwell: Duration) -> Self {
        Self {
            dwell,
            started: Instant::now(),
        }
    }

    fn level_at(&self, elapsed: Duration) -> i32 {
        let dwell = self.dwell.as_millis().max(1);
        let phase = elapsed.as_millis() / dwell;
        if phase % 2 == 0 { FREE_LEVEL } else { OCCUPIED_LEVEL }
    }
}

impl ProximitySensor for SimulatedSensor {
    fn read_raw(&mut self) -> Result<i32> {
        let base = self.level_at(self.started.elapsed());
        let jitter = rand::thread_rng().gen_range(-JITTER..=JITTER);
        Ok((base + jitter).clamp(0, 4095))
    }
}

/// Indicator that logs changes and remembers the last state shown.
///
/// Clones share the same state, so a handle can be kept for inspection.
#[derive(Clone, Default)]
pub struct SimulatedIndicator {
    state: Arc<RwLock<Option<Occupancy>>>,
}

impl SimulatedIndicator {
    pub fn new() -> Self {
        Self::default()
    }

    /// The state currently shown, or `None` before the first update.
    pub fn current(&self) -> Option<Occupancy> {
        *self.state.read()
    }
}

impl Indicator for SimulatedIndicator {
    fn show(&mut self, occupancy: Occupancy) -> Result<()> {
        let old = self.state.write().replace(occupancy);
        if old != Some(occupancy) {
            let led = match occupancy {
                Occupancy::Occupied => "red",
                Occupancy::Free => "green",
            };
            info!("[Sim] Indicator LED -> {} ({})", led, occupancy);
        }
        Ok(())
    }
}
