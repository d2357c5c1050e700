//! Process bring-up: boot connectivity and task spawning.

use crate::config::Config;
use crate::network::{NetworkLink, TimeSource};
use crate::publish::{EventPublisher, Transport};
use crate::sensors::{Indicator, ProximitySensor};
use crate::state::SharedOccupancyState;
use crate::tasks::{ChangeDetector, DetectorTiming, Sampler};
use log::info;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Poll `link` until it reports available, up to `attempts` times.
pub async fn wait_for_network<N: NetworkLink>(
    link: &N,
    attempts: u32,
    interval: Duration,
) -> bool {
    for attempt in 0..attempts {
        if link.is_available() {
            return true;
        }
        if attempt + 1 < attempts {
            tokio::time::sleep(interval).await;
        }
    }
    link.is_available()
}

/// Spawn the sampling loop.
pub fn spawn_sampler<S, I>(
    sensor: S,
    indicator: I,
    state: Arc<SharedOccupancyState>,
    config: &Config,
) -> JoinHandle<()>
where
    S: ProximitySensor + 'static,
    I: Indicator + 'static,
{
    let sampler = Sampler::new(
        sensor,
        indicator,
        state,
        config.thresholds.occupied,
        config.timing.lock_timeout(),
    );
    let period = config.timing.sample_period();
    info!("Sampler running every {:?}", period);
    tokio::spawn(sampler.run(period))
}

/// Spawn the change detection loop. The publisher moves into the task.
pub fn spawn_detector<T, N, C>(
    publisher: EventPublisher<T, N>,
    clock: C,
    state: Arc<SharedOccupancyState>,
    config: &Config,
) -> JoinHandle<()>
where
    T: Transport + 'static,
    N: NetworkLink + 'static,
    C: TimeSource + 'static,
{
    let timing = DetectorTiming {
        period: config.timing.detect_period(),
        startup_delay: config.timing.startup_delay(),
        lock_timeout: config.timing.lock_timeout(),
        lock_backoff: config.timing.lock_backoff(),
    };
    info!("Change detector running every {:?}", timing.period);
    let detector = ChangeDetector::new(
        state,
        publisher,
        clock,
        config.thresholds.change,
        timing,
    );
    tokio::spawn(detector.run())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::publish::Timestamp;
    use crate::sensors::SimulatedIndicator;
    use crate::testing::{FixedClock, RecordingTransport, ScriptedSensor, SwitchableLink};

    #[tokio::test]
    async fn test_wait_for_network_returns_immediately_when_up() {
        let link = SwitchableLink::new(true);
        assert!(wait_for_network(&link, 3, Duration::from_secs(60)).await);
    }

    #[tokio::test]
    async fn test_wait_for_network_gives_up() {
        let link = SwitchableLink::new(false);
        assert!(!wait_for_network(&link, 3, Duration::from_millis(5)).await);
    }

    #[tokio::test]
    async fn test_wait_for_network_sees_late_link() {
        let link = SwitchableLink::new(false);
        let flipper = link.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            flipper.set(true);
        });
        assert!(wait_for_network(&link, 50, Duration::from_millis(10)).await);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_spawned_tasks_publish_one_event_per_transition() {
        let mut config = Config::default();
        config.timing.sample_period_ms = 10;
        config.timing.detect_period_ms = 5;
        config.timing.startup_delay_ms = 20;

        let state = Arc::new(SharedOccupancyState::new());
        let sensor = ScriptedSensor::new(4000);
        let indicator = SimulatedIndicator::new();
        let transport = RecordingTransport::new();
        let publisher = EventPublisher::new(
            transport.clone(),
            SwitchableLink::new(true),
            config.mqtt.topic.clone(),
            Duration::from_millis(5),
        );

        let sampler = spawn_sampler(sensor.clone(), indicator.clone(), state.clone(), &config);
        let detector = spawn_detector(
            publisher,
            FixedClock(Timestamp::Unknown),
            state.clone(),
            &config,
        );

        // Let the baseline settle on the empty-space reading, then park.
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert!(transport.published().is_empty());
        sensor.set(900);
        tokio::time::sleep(Duration::from_millis(150)).await;

        sampler.abort();
        detector.abort();

        let sent = transport.published();
        assert_eq!(sent.len(), 1);
        assert!(sent[0].1.contains(r#""diferenca": -3100"#));
        assert_eq!(
            indicator.current(),
            Some(crate::sensors::Occupancy::Occupied)
        );
    }
}
