use clap::Parser;
use log::{error, info, warn};
use parking_space_monitor::config::{Config, SensorBackend, load_dotenv};
use parking_space_monitor::monitor::{spawn_detector, spawn_sampler, wait_for_network};
use parking_space_monitor::mqtt::MqttClient;
use parking_space_monitor::network::{InterfaceLink, SystemClock};
use parking_space_monitor::publish::EventPublisher;
use parking_space_monitor::sensors::{
    GpioIndicator, SimulatedIndicator, SimulatedSensor, SysfsAdcSensor,
};
use parking_space_monitor::state::SharedOccupancyState;
use std::sync::Arc;
use std::time::Duration;
use tokio::signal;

#[derive(Parser)]
#[command(name = "parking-space-monitor")]
#[command(about = "Monitor a parking space and publish occupancy transitions over MQTT")]
struct Cli {
    /// Use the simulated sensor and indicator regardless of configuration
    #[arg(long)]
    simulate: bool,

    /// MQTT broker host
    #[arg(long)]
    broker: Option<String>,

    /// Topic transition events are published to
    #[arg(long)]
    topic: Option<String>,

    /// Network interface that must be up for publishing
    #[arg(long)]
    interface: Option<String>,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    // Environment is mutated here, while the process is still single-threaded.
    load_dotenv();
    run();
}

#[tokio::main]
async fn run() {
    init_logger();
    let cli = Cli::parse();
    info!("Starting parking space monitor");

    let mut config = Config::from_env();
    if cli.simulate {
        config.sensor.backend = SensorBackend::Simulation;
    }
    if let Some(broker) = cli.broker {
        config.mqtt.broker_host = broker;
    }
    if let Some(topic) = cli.topic {
        config.mqtt.topic = topic;
    }
    if cli.interface.is_some() {
        config.network.interface = cli.interface;
    }
    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("Configuration loaded:");
    info!(
        "  MQTT: {}:{} topic {}",
        config.mqtt.broker_host, config.mqtt.broker_port, config.mqtt.topic
    );
    info!("  Client ID: {}", config.mqtt.client_id);
    info!("  Sensor backend: {:?}", config.sensor.backend);
    info!(
        "  Pins: analog {} digital {} red {} green {} blue {}",
        config.sensor.analog_pin,
        config.sensor.digital_pin,
        config.sensor.red_pin,
        config.sensor.green_pin,
        config.sensor.blue_pin
    );
    info!(
        "  Thresholds: occupied < {}, change > {}",
        config.thresholds.occupied, config.thresholds.change
    );

    let clock = match SystemClock::new(&config.time) {
        Ok(clock) => clock,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let state = Arc::new(SharedOccupancyState::new());

    let sampler_task = match config.sensor.backend {
        SensorBackend::Simulation => spawn_sampler(
            SimulatedSensor::new(Duration::from_secs(config.sensor.simulation_dwell_secs)),
            SimulatedIndicator::new(),
            state.clone(),
            &config,
        ),
        SensorBackend::Sysfs => spawn_sampler(
            SysfsAdcSensor::new(&config.sensor.adc_path),
            GpioIndicator::new(&config.sensor),
            state.clone(),
            &config,
        ),
    };

    let link = InterfaceLink::new(config.network.interface.clone());
    let mut publisher = EventPublisher::new(
        MqttClient::new(&config.mqtt),
        link,
        config.mqtt.topic.clone(),
        config.timing.connect_retry_delay(),
    );

    info!("Waiting for network link...");
    let online = wait_for_network(
        publisher.network(),
        config.network.boot_wait_attempts,
        Duration::from_millis(config.network.boot_wait_interval_ms),
    )
    .await;
    if online {
        publisher.ensure_connected().await;
    } else {
        warn!("Network link down. Publishing disabled until it returns.");
    }

    let detector_task = spawn_detector(publisher, clock, state, &config);

    info!("Parking space monitor is running");
    info!("  - Press Ctrl+C to exit");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Received shutdown signal");
        }
        Err(e) => {
            error!("Failed to listen for shutdown signal: {}", e);
        }
    }

    sampler_task.abort();
    detector_task.abort();

    info!("Parking space monitor stopped");
}
