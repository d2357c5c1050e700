//! Test binary for the MQTT publish path.
//!
//! Usage:
//!   cargo run --bin publish-test -- --prior 4000 --current 1000
//!
//! Connects to the configured broker, publishes one synthetic transition
//! event and reports whether it went out.

use clap::Parser;
use log::{error, info};
use parking_space_monitor::config::Config;
use parking_space_monitor::mqtt::MqttClient;
use parking_space_monitor::network::{InterfaceLink, SystemClock, TimeSource};
use parking_space_monitor::publish::{EventPublisher, PublishOutcome, TransitionEvent};

#[derive(Parser)]
#[command(name = "publish-test")]
#[command(about = "Publish one synthetic parking transition event")]
struct Cli {
    /// Baseline reading of the synthetic event
    #[arg(long, default_value_t = 4000)]
    prior: i32,

    /// Current reading of the synthetic event
    #[arg(long, default_value_t = 1000)]
    current: i32,

    /// Override the configured topic
    #[arg(long, env = "MQTT_TOPIC")]
    topic: Option<String>,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();
}

fn main() {
    // Load .env file before the runtime starts its worker threads
    parking_space_monitor::config::load_dotenv();
    run();
}

#[tokio::main]
async fn run() {
    init_logger();

    let cli = Cli::parse();
    let mut config = Config::from_env();
    if let Some(topic) = cli.topic {
        config.mqtt.topic = topic;
    }

    info!(
        "Publishing test event to {}:{} on {}",
        config.mqtt.broker_host, config.mqtt.broker_port, config.mqtt.topic
    );

    let clock = match SystemClock::new(&config.time) {
        Ok(clock) => clock,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    let mut publisher = EventPublisher::new(
        MqttClient::new(&config.mqtt),
        InterfaceLink::new(config.network.interface.clone()),
        config.mqtt.topic.clone(),
        config.timing.connect_retry_delay(),
    );

    let event = TransitionEvent::new(cli.prior, cli.current, clock.now());
    let outcome = publisher.publish(&event).await;
    info!("Outcome: {:?}", outcome);

    if outcome != PublishOutcome::Published {
        std::process::exit(1);
    }

    info!("Test complete.");
}
