use std::time::Duration;
use thiserror::Error as ThisError;

#[derive(ThisError, Debug)]
pub enum MonitorError {
    #[error("Timed out after {0:?} waiting for occupancy state lock")]
    StateLockTimeout(Duration),

    #[error("Failed to read proximity sensor: {0}")]
    SensorRead(String),

    #[error("Failed to drive indicator: {0}")]
    IndicatorWrite(String),

    #[error("MQTT broker refused connection: {0}")]
    ConnectionRefused(String),

    #[error("MQTT broker did not respond within {0:?}")]
    TransportTimeout(Duration),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    MqttConnection(#[from] rumqttc::ConnectionError),

    #[error(transparent)]
    MqttClient(#[from] rumqttc::ClientError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error(transparent)]
    SerdeJsonError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
