//! Transition detection between consecutive detector cycles.
//!
//! The detector compares the sampler's latest reading with the baseline it
//! recorded on its previous cycle. A jump larger than the change threshold
//! is reported as a transition and published synchronously. The baseline is
//! advanced every cycle, so a reading that stays put produces one event.
//!
//! This is independent of the sampler's absolute occupancy threshold; the
//! two classifications may disagree.

use crate::network::{NetworkLink, TimeSource};
use crate::publish::{EventPublisher, PublishOutcome, Transport, TransitionEvent};
use crate::state::SharedOccupancyState;
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use strum::Display;

/// Direction of a detected change, taken literally from the sign of the delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Transition {
    #[strum(serialize = "became occupied")]
    BecameOccupied,
    #[strum(serialize = "became free")]
    BecameFree,
}

/// Classify a pair of readings.
///
/// `previous == 0` means no baseline has been recorded yet and never reports.
pub fn detect_transition(previous: i32, current: i32, threshold: i32) -> Option<Transition> {
    if previous == 0 {
        return None;
    }
    let delta = current.saturating_sub(previous);
    if delta > threshold {
        Some(Transition::BecameOccupied)
    } else if delta < -threshold {
        Some(Transition::BecameFree)
    } else {
        None
    }
}

/// Result of one detector cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// The state lock was busy; nothing was read.
    Skipped,
    /// No reportable change.
    Steady { delta: i32 },
    /// A transition was detected and handed to the publisher.
    Transition {
        transition: Transition,
        delta: i32,
        outcome: PublishOutcome,
    },
}

#[derive(Debug, Clone)]
pub struct DetectorTiming {
    pub period: Duration,
    pub startup_delay: Duration,
    pub lock_timeout: Duration,
    pub lock_backoff: Duration,
}

pub struct ChangeDetector<T, N, C> {
    state: Arc<SharedOccupancyState>,
    publisher: EventPublisher<T, N>,
    clock: C,
    change_threshold: i32,
    timing: DetectorTiming,
}

impl<T: Transport, N: NetworkLink, C: TimeSource> ChangeDetector<T, N, C> {
    pub fn new(
        state: Arc<SharedOccupancyState>,
        publisher: EventPublisher<T, N>,
        clock: C,
        change_threshold: i32,
        timing: DetectorTiming,
    ) -> Self {
        Self {
            state,
            publisher,
            clock,
            change_threshold,
            timing,
        }
    }

    /// One detection cycle.
    pub async fn tick(&mut self) -> TickOutcome {
        let snapshot = self
            .state
            .with_lock(self.timing.lock_timeout, |record| {
                (record.current_raw, record.previous_raw)
            })
            .await;

        let snapshot = match snapshot {
            Ok(values) => Some(values),
            Err(e) => {
                debug!("[Detector] Skipping cycle: {}", e);
                None
            }
        };
        let Some((current, previous)) = snapshot else {
            tokio::time::sleep(self.timing.lock_backoff).await;
            return TickOutcome::Skipped;
        };

        let delta = current.saturating_sub(previous);
        let outcome = match detect_transition(previous, current, self.change_threshold) {
            Some(transition) => {
                info!(
                    "[Detector] Change detected: space {} ({} -> {}, delta {})",
                    transition, previous, current, delta
                );
                let event = TransitionEvent::new(previous, current, self.clock.now());
                let outcome = self.publisher.publish(&event).await;
                TickOutcome::Transition {
                    transition,
                    delta,
                    outcome,
                }
            }
            None => TickOutcome::Steady { delta },
        };

        // Advance the baseline whether or not anything was reported.
        if let Err(e) = self
            .state
            .with_lock(self.timing.lock_timeout, |record| {
                record.previous_raw = current;
            })
            .await
        {
            debug!("[Detector] Baseline not advanced: {}", e);
        }

        outcome
    }

    /// Detect forever, after letting the sampler record a first reading.
    pub async fn run(mut self) {
        tokio::time::sleep(self.timing.startup_delay).await;

        loop {
            // A skipped cycle has already backed off; retry straight away.
            if self.tick().await == TickOutcome::Skipped {
                continue;
            }
            tokio::time::sleep(self.timing.period).await;
        }
    }
}
