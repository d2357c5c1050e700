//! Linux sysfs hardware backend.
//!
//! Reads the proximity sensor through an IIO ADC channel and drives the
//! RGB status LED through exported GPIO value files.

use super::{Indicator, Occupancy, ProximitySensor};
use crate::config::SensorConfig;
use crate::error::{MonitorError, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Largest value the 12-bit ADC can report.
pub const ADC_MAX: i32 = 4095;

/// Analog proximity sensor exposed as an IIO `in_voltageN_raw` file.
pub struct SysfsAdcSensor {
    path: PathBuf,
}

impl SysfsAdcSensor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ProximitySensor for SysfsAdcSensor {
    fn read_raw(&mut self) -> Result<i32> {
        let content = fs::read_to_string(&self.path)?;
        let raw: i32 = content.trim().parse().map_err(|e| {
            MonitorError::SensorRead(format!(
                "{}: invalid value {:?}: {}",
                self.path.display(),
                content.trim(),
                e
            ))
        })?;
        if !(0..=ADC_MAX).contains(&raw) {
            return Err(MonitorError::SensorRead(format!(
                "{}: reading {} outside 0..={}",
                self.path.display(),
                raw,
                ADC_MAX
            )));
        }
        Ok(raw)
    }
}

/// RGB LED wired to three GPIO lines; red means occupied, green means free.
///
/// The blue line carries no meaning and is held low.
pub struct GpioIndicator {
    red: PathBuf,
    green: PathBuf,
    blue: PathBuf,
}

impl GpioIndicator {
    pub fn new(config: &SensorConfig) -> Self {
        let root = Path::new(&config.gpio_root);
        Self {
            red: gpio_value_path(root, config.red_pin),
            green: gpio_value_path(root, config.green_pin),
            blue: gpio_value_path(root, config.blue_pin),
        }
    }

    fn write_pin(path: &Path, high: bool) -> Result<()> {
        fs::write(path, if high { "1" } else { "0" }).map_err(|e| {
            MonitorError::IndicatorWrite(format!("{}: {}", path.display(), e))
        })
    }
}

fn gpio_value_path(root: &Path, pin: u8) -> PathBuf {
    root.join(format!("gpio{}", pin)).join("value")
}

impl Indicator for GpioIndicator {
    fn show(&mut self, occupancy: Occupancy) -> Result<()> {
        let occupied = occupancy.is_occupied();
        // Turn the old colour off first so both are never lit together.
        if occupied {
            Self::write_pin(&self.green, false)?;
            Self::write_pin(&self.red, true)?;
        } else {
            Self::write_pin(&self.red, false)?;
            Self::write_pin(&self.green, true)?;
        }
        Self::write_pin(&self.blue, false)?;
        debug!("Indicator set to {}", occupancy);
        Ok(())
    }
}
