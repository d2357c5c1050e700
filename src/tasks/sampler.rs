//! Periodic sensor sampling and local indicator.

use crate::sensors::{Indicator, Occupancy, ProximitySensor};
use crate::state::SharedOccupancyState;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Reads the proximity sensor, classifies the reading and publishes it into
/// the shared state. Also owns the indicator.
pub struct Sampler<S, I> {
    sensor: S,
    indicator: I,
    state: Arc<SharedOccupancyState>,
    occupied_threshold: i32,
    lock_timeout: Duration,
}

impl<S: ProximitySensor, I: Indicator> Sampler<S, I> {
    pub fn new(
        sensor: S,
        indicator: I,
        state: Arc<SharedOccupancyState>,
        occupied_threshold: i32,
        lock_timeout: Duration,
    ) -> Self {
        Self {
            sensor,
            indicator,
            state,
            occupied_threshold,
            lock_timeout,
        }
    }

    /// One sampling cycle. Returns the classification written, or `None`
    /// when the cycle was skipped.
    pub async fn tick(&mut self) -> Option<Occupancy> {
        let raw = match self.sensor.read_raw() {
            Ok(raw) => raw,
            Err(e) => {
                warn!("[Sampler] Sensor read failed: {}", e);
                return None;
            }
        };

        let threshold = self.occupied_threshold;
        let indicator = &mut self.indicator;
        let written = self
            .state
            .with_lock(self.lock_timeout, |record| {
                record.current_raw = raw;
                let occupancy = Occupancy::classify(raw, threshold);
                record.occupied = occupancy.is_occupied();
                (occupancy, indicator.show(occupancy))
            })
            .await;

        match written {
            Ok((occupancy, shown)) => {
                if let Err(e) = shown {
                    warn!("[Sampler] Indicator update failed: {}", e);
                }
                info!("[Sampler] Space {} - reading: {}", occupancy, raw);
                Some(occupancy)
            }
            Err(e) => {
                debug!("[Sampler] Skipping cycle: {}", e);
                None
            }
        }
    }

    /// Sample forever at `period`, starting from a free indicator.
    pub async fn run(mut self, period: Duration) {
        if let Err(e) = self.indicator.show(Occupancy::Free) {
            warn!("[Sampler] Indicator init failed: {}", e);
        }

        let mut interval = tokio::time::interval(period);
        loop {
            interval.tick().await;
            self.tick().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensors::SimulatedIndicator;
    use crate::testing::ScriptedSensor;

    const THRESHOLD: i32 = 3500;
    const WAIT: Duration = Duration::from_millis(50);

    fn sampler(
        raw: i32,
    ) -> (
        Sampler<ScriptedSensor, SimulatedIndicator>,
        ScriptedSensor,
        SimulatedIndicator,
        Arc<SharedOccupancyState>,
    ) {
        let sensor = ScriptedSensor::new(raw);
        let indicator = SimulatedIndicator::new();
        let state = Arc::new(SharedOccupancyState::new());
        let sampler = Sampler::new(
            sensor.clone(),
            indicator.clone(),
            state.clone(),
            THRESHOLD,
            WAIT,
        );
        (sampler, sensor, indicator, state)
    }

    #[tokio::test]
    async fn test_tick_writes_reading_and_classification() {
        let (mut sampler, sensor, indicator, state) = sampler(1000);

        assert_eq!(sampler.tick().await, Some(Occupancy::Occupied));
        let record = state.with_lock(WAIT, |r| *r).await.unwrap();
        assert_eq!(record.current_raw, 1000);
        assert!(record.occupied);
        assert_eq!(indicator.current(), Some(Occupancy::Occupied));

        sensor.set(THRESHOLD);
        assert_eq!(sampler.tick().await, Some(Occupancy::Free));
        let record = state.with_lock(WAIT, |r| *r).await.unwrap();
        assert_eq!(record.current_raw, THRESHOLD);
        assert!(!record.occupied);
        assert_eq!(indicator.current(), Some(Occupancy::Free));
    }

    #[tokio::test]
    async fn test_tick_never_touches_baseline() {
        let (mut sampler, _sensor, _indicator, state) = sampler(1000);
        state
            .with_lock(WAIT, |r| r.previous_raw = 4000)
            .await
            .unwrap();

        sampler.tick().await;
        let record = state.with_lock(WAIT, |r| *r).await.unwrap();
        assert_eq!(record.previous_raw, 4000);
    }

    #[tokio::test]
    async fn test_sensor_failure_skips_cycle() {
        let (mut sampler, sensor, indicator, state) = sampler(1000);
        sampler.tick().await;

        sensor.fail();
        assert_eq!(sampler.tick().await, None);
        let record = state.with_lock(WAIT, |r| *r).await.unwrap();
        assert_eq!(record.current_raw, 1000);
        assert_eq!(indicator.current(), Some(Occupancy::Occupied));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_held_lock_skips_cycle_without_partial_write() {
        let (mut sampler, _sensor, indicator, state) = sampler(1000);

        // Hold the state lock on another worker across the sampler's bounded wait.
        let holder = state.clone();
        let (locked_tx, locked_rx) = tokio::sync::oneshot::channel();
        let handle = tokio::spawn(async move {
            holder
                .with_lock(WAIT, |_| {
                    let _ = locked_tx.send(());
                    std::thread::sleep(Duration::from_millis(250));
                })
                .await
                .unwrap();
        });
        locked_rx.await.unwrap();

        assert_eq!(sampler.tick().await, None);
        assert_eq!(indicator.current(), None);

        handle.await.unwrap();
        let record = state.with_lock(WAIT, |r| *r).await.unwrap();
        assert_eq!(record.current_raw, 0);
        assert!(!record.occupied);
    }
}
