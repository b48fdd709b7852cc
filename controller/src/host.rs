use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::Context;
use chrono_tz::Tz;
use thermostat_common::{config::MqttConfig, RuntimeConfig, ThermostatEngine, TransportConfig};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::{
    adapters::{
        ConsoleDisplay, LoggingActuators, SerialDeviceTransport, SimulatedSensor, StdinButtons,
        StdoutTransport,
    },
    input::InputDispatcher,
    mqtt::MqttTransport,
    ports::StatusTransport,
    status_task::{StatusTask, TerminationFlag},
    thermostat::Thermostat,
};

pub async fn run() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config_path = std::env::var("THERMOSTAT_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./.thermostat/runtime.json"));
    let runtime = load_runtime_config(&config_path).await.unwrap_or_else(|err| {
        warn!("failed to load runtime config from {}: {err:#}", config_path.display());
        RuntimeConfig::default()
    });

    let timezone = match runtime.timezone.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(err) => {
            warn!("unknown timezone {:?} ({err}), using local time", runtime.timezone);
            None
        }
    };

    let settings = runtime.thermostat.clone();
    let thermostat = Thermostat::new(
        ThermostatEngine::new(runtime.initial),
        Box::new(LoggingActuators),
        Arc::new(SimulatedSensor::new(runtime.simulation.clone())),
        Duration::from_millis(settings.sensor_timeout_ms),
    );
    thermostat.reevaluate().await;

    let transport = build_transport(&runtime.transport).await?;

    let termination = TerminationFlag::new();
    let status_task = StatusTask::new(
        thermostat.clone(),
        Box::new(ConsoleDisplay::default()),
        transport,
        timezone,
        settings.clone(),
    )
    .spawn(&termination);

    let (triggers_tx, triggers_rx) = mpsc::channel(16);
    let dispatcher = InputDispatcher::new(thermostat.clone()).spawn(triggers_rx);
    let _buttons = StdinButtons::new(Duration::from_millis(settings.debounce_ms))
        .spawn(triggers_tx)
        .context("failed to start button thread")?;

    info!(
        "thermostat running: mode={} set_point={}F",
        runtime.initial.mode, runtime.initial.set_point_f
    );

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for interrupt signal")?;

    info!("cleaning up, exiting");
    termination.set();
    status_task.await.context("status task failed")?;
    dispatcher.abort();

    info!("final status: {}", thermostat.status_line().await);
    Ok(())
}

async fn load_runtime_config(path: &Path) -> anyhow::Result<RuntimeConfig> {
    match tokio::fs::read(path).await {
        Ok(raw) => Ok(RuntimeConfig::from_json_slice(&raw)?),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(RuntimeConfig::default()),
        Err(err) => Err(err.into()),
    }
}

async fn build_transport(config: &TransportConfig) -> anyhow::Result<Arc<dyn StatusTransport>> {
    let transport: Arc<dyn StatusTransport> = match config {
        TransportConfig::Stdout => Arc::new(StdoutTransport::new()),
        TransportConfig::Serial { path } => Arc::new(
            SerialDeviceTransport::open(path)
                .await
                .with_context(|| format!("failed to open serial device {path}"))?,
        ),
        TransportConfig::Mqtt(mqtt) => {
            Arc::new(MqttTransport::connect(&with_env_overrides(mqtt.clone())).await?)
        }
    };
    Ok(transport)
}

fn with_env_overrides(mut mqtt: MqttConfig) -> MqttConfig {
    if let Ok(host) = std::env::var("MQTT_HOST") {
        mqtt.host = host;
    }
    if let Some(port) = std::env::var("MQTT_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
    {
        mqtt.port = port;
    }
    if let Ok(user) = std::env::var("MQTT_USER") {
        mqtt.user = user;
        mqtt.pass = std::env::var("MQTT_PASS").unwrap_or_default();
    }
    mqtt
}
