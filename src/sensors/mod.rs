//! Proximity sensing and the local occupancy indicator.
//!
//! The monitor only needs two narrow capabilities from the hardware: a raw
//! proximity reading and a two-state indicator. Backends live in
//! [`sysfs`] (real ADC and GPIO files) and [`simulation`].

pub mod simulation;
pub mod sysfs;

use crate::error::Result;
use strum::Display;

pub use simulation::{SimulatedIndicator, SimulatedSensor};
pub use sysfs::{GpioIndicator, SysfsAdcSensor};

/// Occupancy of the monitored space as seen by the sampler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Occupancy {
    #[strum(serialize = "OCCUPIED")]
    Occupied,
    #[strum(serialize = "FREE")]
    Free,
}

impl Occupancy {
    /// Lower readings mean a closer object, so anything under `threshold` is occupied.
    pub fn classify(raw: i32, threshold: i32) -> Self {
        if raw < threshold {
            Occupancy::Occupied
        } else {
            Occupancy::Free
        }
    }

    pub fn is_occupied(self) -> bool {
        self == Occupancy::Occupied
    }
}

/// Source of raw proximity readings.
pub trait ProximitySensor: Send {
    /// Read one raw sample. Lower values mean a closer object.
    fn read_raw(&mut self) -> Result<i32>;
}

/// Two-state local indicator (occupied vs free); never shows both.
pub trait Indicator: Send {
    fn show(&mut self, occupancy: Occupancy) -> Result<()>;
}
