//! System clock as a time source for event timestamps.

use super::TimeSource;
use crate::config::TimeConfig;
use crate::error::{MonitorError, Result};
use crate::publish::Timestamp;
use chrono::{DateTime, Datelike, FixedOffset, Utc};

/// Local time at a fixed UTC offset.
///
/// A board without NTP boots near the epoch, so readings before
/// `min_valid_year` are reported as [`Timestamp::Unknown`].
#[derive(Debug, Clone)]
pub struct SystemClock {
    offset: FixedOffset,
    min_valid_year: i32,
}

impl SystemClock {
    pub fn new(config: &TimeConfig) -> Result<Self> {
        let offset = FixedOffset::east_opt(config.utc_offset_hours * 3600).ok_or_else(|| {
            MonitorError::Config(format!(
                "invalid UTC offset: {} hours",
                config.utc_offset_hours
            ))
        })?;
        Ok(Self {
            offset,
            min_valid_year: config.min_valid_year,
        })
    }

    fn timestamp_at(&self, utc: DateTime<Utc>) -> Timestamp {
        let local = utc.with_timezone(&self.offset);
        if local.year() < self.min_valid_year {
            Timestamp::Unknown
        } else {
            Timestamp::At(local.naive_local())
        }
    }
}

impl TimeSource for SystemClock {
    fn now(&self) -> Timestamp {
        self.timestamp_at(Utc::now())
    }
}
