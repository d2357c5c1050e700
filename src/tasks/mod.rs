//! The two periodic activities: sampling and change detection.
//!
//! They share nothing but the [`SharedOccupancyState`](crate::state::SharedOccupancyState)
//! and are spawned as independent tokio tasks.

pub mod detector;
pub mod sampler;

pub use detector::{ChangeDetector, DetectorTiming, TickOutcome, Transition, detect_transition};
pub use sampler::Sampler;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Result;
    use crate::sensors::{ProximitySensor, SimulatedIndicator};
    use crate::state::SharedOccupancyState;
    use rand::Rng;
    use std::sync::Arc;
    use std::time::Duration;

    const THRESHOLD: i32 = 3500;

    struct NoisySensor;

    impl ProximitySensor for NoisySensor {
        fn read_raw(&mut self) -> Result<i32> {
            Ok(rand::thread_rng().gen_range(1..4096))
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_readers_never_see_torn_record() {
        let state = Arc::new(SharedOccupancyState::new());
        let wait = Duration::from_millis(100);

        let mut writers = Vec::new();
        for _ in 0..2 {
            let mut sampler = Sampler::new(
                NoisySensor,
                SimulatedIndicator::new(),
                state.clone(),
                THRESHOLD,
                wait,
            );
            writers.push(tokio::spawn(async move {
                for _ in 0..500 {
                    sampler.tick().await;
                    tokio::task::yield_now().await;
                }
            }));
        }

        let mut readers = Vec::new();
        for _ in 0..2 {
            let state = state.clone();
            readers.push(tokio::spawn(async move {
                let mut checked = 0;
                for _ in 0..1000 {
                    if let Ok(record) = state.with_lock(wait, |r| *r).await {
                        if record.current_raw != 0 {
                            assert_eq!(record.occupied, record.current_raw < THRESHOLD);
                            checked += 1;
                        }
                    }
                    tokio::task::yield_now().await;
                }
                checked
            }));
        }

        for writer in writers {
            writer.await.unwrap();
        }
        for reader in readers {
            reader.await.unwrap();
        }

        let record = state.with_lock(wait, |r| *r).await.unwrap();
        assert_ne!(record.current_raw, 0);
        assert_eq!(record.occupied, record.current_raw < THRESHOLD);
    }
}
