//! Shared occupancy record guarded by a lock with a bounded wait.
//!
//! The sampler and the change detector only ever touch the record through
//! [`SharedOccupancyState::with_lock`], so every read sees a record written
//! in its entirety by one writer.

use crate::error::{MonitorError, Result};
use std::time::Duration;
use tokio::sync::Mutex;

/// The fields shared between the sampler and the change detector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OccupancyRecord {
    /// Most recent raw sample, written by the sampler.
    pub current_raw: i32,
    /// Baseline as of the last detector cycle, written by the detector.
    pub previous_raw: i32,
    /// `current_raw < occupied threshold`, written by the sampler.
    pub occupied: bool,
}

/// Process-wide occupancy state.
///
/// Share it behind an `Arc`; it starts zeroed with `occupied = false`.
#[derive(Debug, Default)]
pub struct SharedOccupancyState {
    record: Mutex<OccupancyRecord>,
}

impl SharedOccupancyState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `f` with exclusive access to the record.
    ///
    /// Waits at most `wait` for the lock. On timeout `f` is not called and
    /// [`MonitorError::StateLockTimeout`] is returned so the caller can skip
    /// its cycle. The guard is dropped when `f` returns or unwinds.
    pub async fn with_lock<R>(
        &self,
        wait: Duration,
        f: impl FnOnce(&mut OccupancyRecord) -> R,
    ) -> Result<R> {
        let mut guard = tokio::time::timeout(wait, self.record.lock())
            .await
            .map_err(|_| MonitorError::StateLockTimeout(wait))?;
        Ok(f(&mut *guard))
    }
}
