use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::ThermostatMode;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid runtime config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThermostatConfig {
    pub tick_ms: u64,
    pub report_every_ticks: u32,
    pub sensor_timeout_ms: u64,
    pub transport_timeout_ms: u64,
    pub display_columns: usize,
    pub debounce_ms: u64,
}

impl Default for ThermostatConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1_000,
            report_every_ticks: 30,
            sensor_timeout_ms: 500,
            transport_timeout_ms: 1_000,
            display_columns: 16,
            debounce_ms: 100,
        }
    }
}

impl ThermostatConfig {
    pub fn sanitize(&mut self) {
        self.tick_ms = self.tick_ms.clamp(10, 60_000);
        self.report_every_ticks = self.report_every_ticks.max(1);
        self.sensor_timeout_ms = self.sensor_timeout_ms.clamp(1, self.tick_ms);
        self.transport_timeout_ms = self.transport_timeout_ms.clamp(1, 30_000);
        self.display_columns = self.display_columns.clamp(8, 80);
    }
}

/// Power-on state. Never written back; the set point starts here on every boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialSettings {
    pub mode: ThermostatMode,
    pub set_point_f: i32,
}

impl Default for InitialSettings {
    fn default() -> Self {
        Self {
            mode: ThermostatMode::Off,
            set_point_f: 72,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub pass: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 1883,
            user: String::new(),
            pass: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransportConfig {
    #[default]
    Stdout,
    Serial { path: String },
    Mqtt(MqttConfig),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub base_temp_c: f32,
    pub fail_every_reads: u32,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            base_temp_c: 21.0,
            fail_every_reads: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    pub thermostat: ThermostatConfig,
    pub initial: InitialSettings,
    pub timezone: String,
    pub transport: TransportConfig,
    pub simulation: SimulationConfig,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            thermostat: ThermostatConfig::default(),
            initial: InitialSettings::default(),
            timezone: "America/New_York".to_string(),
            transport: TransportConfig::default(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl RuntimeConfig {
    pub fn from_json_slice(raw: &[u8]) -> Result<Self, ConfigError> {
        let mut config: Self = serde_json::from_slice(raw)?;
        config.thermostat.sanitize();
        Ok(config)
    }
}
