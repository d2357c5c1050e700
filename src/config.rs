use crate::error::{MonitorError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Load environment variables from .env file with robust parsing.
/// Handles values with spaces without requiring quotes.
///
/// Must run before any other thread exists; both binaries call it from a
/// synchronous `main` ahead of building the tokio runtime.
pub fn load_dotenv() {
    let env_path = Path::new(".env");
    if !env_path.exists() {
        return;
    }

    let content = match fs::read_to_string(env_path) {
        Ok(c) => c,
        Err(_) => return,
    };

    for (key, value) in parse_dotenv(&content) {
        // Only set if not already set (env vars take precedence)
        if std::env::var(key).is_err() {
            // SAFETY: Only called from a synchronous main, before the tokio runtime
            // is built, so no other thread can read the environment concurrently.
            unsafe { std::env::set_var(key, value) };
        }
    }
}

/// Split `.env` content into key/value pairs, skipping blanks and comments.
fn parse_dotenv(content: &str) -> Vec<(&str, &str)> {
    let mut pairs = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(eq_pos) = line.find('=') {
            let key = line[..eq_pos].trim();
            let mut value = line[eq_pos + 1..].trim();

            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = &value[1..value.len() - 1];
            }

            pairs.push((key, value));
        }
    }

    pairs
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub network: NetworkConfig,
    pub mqtt: MqttConfig,
    pub sensor: SensorConfig,
    pub timing: TimingConfig,
    pub thresholds: ThresholdConfig,
    pub time: TimeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Interface that must be up for publishing; any non-loopback one when unset
    pub interface: Option<String>,
    pub boot_wait_attempts: u32,
    pub boot_wait_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MqttConfig {
    pub broker_host: String,
    pub broker_port: u16,
    pub client_id: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub topic: String,
    pub keep_alive_secs: u64,
    pub io_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SensorBackend {
    Simulation,
    Sysfs,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SensorConfig {
    pub backend: SensorBackend,
    /// IIO raw value file for the analog proximity channel
    pub adc_path: String,
    pub gpio_root: String,
    pub analog_pin: u8,
    pub digital_pin: u8,
    pub red_pin: u8,
    pub green_pin: u8,
    pub blue_pin: u8,
    /// How long the simulated car stays (or stays away) before the reading flips
    pub simulation_dwell_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    pub sample_period_ms: u64,
    pub detect_period_ms: u64,
    pub startup_delay_ms: u64,
    pub lock_timeout_ms: u64,
    pub lock_backoff_ms: u64,
    pub connect_retry_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    /// Raw readings below this value classify the space as occupied
    pub occupied: i32,
    /// Minimum |delta| between detector cycles that counts as a transition
    pub change: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeConfig {
    pub utc_offset_hours: i32,
    /// Clock readings before this year are treated as unsynchronized
    pub min_valid_year: i32,
}

impl TimingConfig {
    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(self.sample_period_ms)
    }

    pub fn detect_period(&self) -> Duration {
        Duration::from_millis(self.detect_period_ms)
    }

    pub fn startup_delay(&self) -> Duration {
        Duration::from_millis(self.startup_delay_ms)
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    pub fn lock_backoff(&self) -> Duration {
        Duration::from_millis(self.lock_backoff_ms)
    }

    pub fn connect_retry_delay(&self) -> Duration {
        Duration::from_millis(self.connect_retry_delay_ms)
    }
}

impl MqttConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    pub fn io_timeout(&self) -> Duration {
        Duration::from_millis(self.io_timeout_ms)
    }
}

fn default_client_id() -> String {
    format!(
        "parking-sensor-{}",
        gethostname::gethostname().to_string_lossy()
    )
}

impl Default for Config {
    fn default() -> Self {
        Self {
            network: NetworkConfig {
                interface: None,
                boot_wait_attempts: 20,
                boot_wait_interval_ms: 500,
            },
            mqtt: MqttConfig {
                broker_host: "172.26.67.41".to_string(),
                broker_port: 1883,
                client_id: default_client_id(),
                username: None,
                password: None,
                topic: "/vaga1/status".to_string(),
                keep_alive_secs: 30,
                io_timeout_ms: 2000,
            },
            sensor: SensorConfig {
                backend: SensorBackend::Simulation,
                adc_path: "/sys/bus/iio/devices/iio:device0/in_voltage0_raw".to_string(),
                gpio_root: "/sys/class/gpio".to_string(),
                analog_pin: 34,
                digital_pin: 14,
                red_pin: 27,
                green_pin: 26,
                blue_pin: 25,
                simulation_dwell_secs: 15,
            },
            timing: TimingConfig {
                sample_period_ms: 1000,
                detect_period_ms: 200,
                startup_delay_ms: 500,
                lock_timeout_ms: 100,
                lock_backoff_ms: 50,
                connect_retry_delay_ms: 500,
            },
            thresholds: ThresholdConfig {
                occupied: 3500,
                change: 2000,
            },
            time: TimeConfig {
                utc_offset_hours: -3,
                min_valid_year: 2020,
            },
        }
    }
}

/// Overwrite `target` with the parsed value of `key` when it is set and valid.
fn env_parse<T: std::str::FromStr>(key: &str, target: &mut T) {
    if let Ok(raw) = std::env::var(key)
        && let Ok(value) = raw.parse()
    {
        *target = value;
    }
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        // Network
        if let Ok(interface) = std::env::var("PARKING_NET_INTERFACE") {
            config.network.interface = Some(interface);
        }
        env_parse(
            "PARKING_BOOT_WAIT_ATTEMPTS",
            &mut config.network.boot_wait_attempts,
        );

        // MQTT configuration
        if let Ok(host) = std::env::var("MQTT_BROKER_HOST") {
            config.mqtt.broker_host = host;
        }
        env_parse("MQTT_BROKER_PORT", &mut config.mqtt.broker_port);
        if let Ok(client_id) = std::env::var("MQTT_CLIENT_ID") {
            config.mqtt.client_id = client_id;
        }
        if let Ok(username) = std::env::var("MQTT_USERNAME") {
            config.mqtt.username = Some(username);
        }
        if let Ok(password) = std::env::var("MQTT_PASSWORD") {
            config.mqtt.password = Some(password);
        }
        if let Ok(topic) = std::env::var("MQTT_TOPIC") {
            config.mqtt.topic = topic;
        }

        // Sensor hardware
        match std::env::var("PARKING_SENSOR_BACKEND").as_deref() {
            Ok("sysfs") => config.sensor.backend = SensorBackend::Sysfs,
            Ok("simulation") => config.sensor.backend = SensorBackend::Simulation,
            _ => {}
        }
        if let Ok(path) = std::env::var("PARKING_ADC_PATH") {
            config.sensor.adc_path = path;
        }
        if let Ok(root) = std::env::var("PARKING_GPIO_ROOT") {
            config.sensor.gpio_root = root;
        }
        env_parse("PARKING_RED_PIN", &mut config.sensor.red_pin);
        env_parse("PARKING_GREEN_PIN", &mut config.sensor.green_pin);
        env_parse("PARKING_BLUE_PIN", &mut config.sensor.blue_pin);

        // Timing and thresholds
        env_parse(
            "PARKING_SAMPLE_PERIOD_MS",
            &mut config.timing.sample_period_ms,
        );
        env_parse(
            "PARKING_DETECT_PERIOD_MS",
            &mut config.timing.detect_period_ms,
        );
        env_parse("PARKING_THRESHOLD_OCCUPIED", &mut config.thresholds.occupied);
        env_parse("PARKING_THRESHOLD_CHANGE", &mut config.thresholds.change);
        env_parse("PARKING_UTC_OFFSET_HOURS", &mut config.time.utc_offset_hours);

        config
    }

    /// Reject settings that would stall a loop or make detection meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.timing.sample_period_ms == 0 || self.timing.detect_period_ms == 0 {
            return Err(MonitorError::Config(
                "sample and detect periods must be non-zero".to_string(),
            ));
        }
        if self.thresholds.change <= 0 {
            return Err(MonitorError::Config(format!(
                "change threshold must be positive, got {}",
                self.thresholds.change
            )));
        }
        if self.mqtt.topic.is_empty() {
            return Err(MonitorError::Config("MQTT topic is empty".to_string()));
        }
        if !(-23..=23).contains(&self.time.utc_offset_hours) {
            return Err(MonitorError::Config(format!(
                "UTC offset out of range: {}",
                self.time.utc_offset_hours
            )));
        }
        Ok(())
    }
}
