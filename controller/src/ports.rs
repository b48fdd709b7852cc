use std::time::Duration;

use async_trait::async_trait;
use thermostat_common::{Actuator, ActuatorLevel};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SensorError {
    #[error("sensor read failed: {0}")]
    Read(String),
    #[error("sensor read timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("status write failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("status publish failed: {0}")]
    Mqtt(#[from] rumqttc::ClientError),
    #[error("status write timed out after {0:?}")]
    Timeout(Duration),
}

#[async_trait]
pub trait TemperatureSource: Send + Sync {
    async fn read_fahrenheit(&self) -> Result<f32, SensorError>;
}

pub trait ActuatorPair: Send {
    fn set(&mut self, actuator: Actuator, level: ActuatorLevel);
}

pub trait DisplayPort: Send {
    fn write(&mut self, line1: &str, line2: &str);

    fn release(&mut self);
}

#[async_trait]
pub trait StatusTransport: Send + Sync {
    /// Sends one status line. Implementations add the line terminator.
    async fn write_line(&self, line: &str) -> Result<(), TransportError>;
}

pub async fn read_with_deadline(
    source: &dyn TemperatureSource,
    deadline: Duration,
) -> Result<f32, SensorError> {
    match tokio::time::timeout(deadline, source.read_fahrenheit()).await {
        Ok(result) => result,
        Err(_) => Err(SensorError::Timeout(deadline)),
    }
}

pub async fn write_with_deadline(
    transport: &dyn StatusTransport,
    line: &str,
    deadline: Duration,
) -> Result<(), TransportError> {
    match tokio::time::timeout(deadline, transport.write_line(line)).await {
        Ok(result) => result,
        Err(_) => Err(TransportError::Timeout(deadline)),
    }
}
