use std::{
    collections::HashMap,
    io::BufRead,
    path::Path,
    sync::atomic::{AtomicU64, Ordering},
    thread,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use thermostat_common::{
    config::SimulationConfig, types::celsius_to_fahrenheit, Actuator, ActuatorLevel,
};
use tokio::{
    fs::{File, OpenOptions},
    io::{AsyncWriteExt, Stdout},
    sync::{mpsc, Mutex},
};
use tracing::{debug, info, warn};

use crate::{
    input::InputTrigger,
    ports::{
        ActuatorPair, DisplayPort, SensorError, StatusTransport, TemperatureSource,
        TransportError,
    },
};

pub struct SimulatedSensor {
    config: SimulationConfig,
    reads: AtomicU64,
}

impl SimulatedSensor {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            reads: AtomicU64::new(0),
        }
    }
}

#[async_trait]
impl TemperatureSource for SimulatedSensor {
    async fn read_fahrenheit(&self) -> Result<f32, SensorError> {
        let read = self.reads.fetch_add(1, Ordering::Relaxed) + 1;
        let fail_every = u64::from(self.config.fail_every_reads);
        if fail_every > 0 && read % fail_every == 0 {
            return Err(SensorError::Read(format!("simulated failure on read {read}")));
        }

        let celsius = self.config.base_temp_c + (read % 8) as f32 * 0.1;
        Ok(celsius_to_fahrenheit(celsius))
    }
}

#[derive(Debug, Default)]
pub struct LoggingActuators;

impl ActuatorPair for LoggingActuators {
    fn set(&mut self, actuator: Actuator, level: ActuatorLevel) {
        info!("{} indicator -> {}", actuator.as_str(), level.as_str());
    }
}

#[derive(Debug, Default)]
pub struct ConsoleDisplay {
    released: bool,
}

impl DisplayPort for ConsoleDisplay {
    fn write(&mut self, line1: &str, line2: &str) {
        if self.released {
            warn!("display write after release ignored");
            return;
        }
        info!(target: "display", "{line1} | {line2}");
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            info!(target: "display", "display cleared");
        }
    }
}

pub struct StdoutTransport {
    stdout: Mutex<Stdout>,
}

impl StdoutTransport {
    pub fn new() -> Self {
        Self {
            stdout: Mutex::new(tokio::io::stdout()),
        }
    }
}

impl Default for StdoutTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusTransport for StdoutTransport {
    async fn write_line(&self, line: &str) -> Result<(), TransportError> {
        let mut stdout = self.stdout.lock().await;
        stdout.write_all(format!("{line}\n").as_bytes()).await?;
        stdout.flush().await?;
        Ok(())
    }
}

/// Appends status lines to a serial device node (or any file). Line settings are
/// expected to be configured on the port beforehand, e.g. with `stty`.
pub struct SerialDeviceTransport {
    file: Mutex<File>,
}

impl SerialDeviceTransport {
    pub async fn open(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let file = OpenOptions::new()
            .append(true)
            .create(true)
            .open(path.as_ref())
            .await?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl StatusTransport for SerialDeviceTransport {
    async fn write_line(&self, line: &str) -> Result<(), TransportError> {
        let mut file = self.file.lock().await;
        file.write_all(format!("{line}\n").as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }
}

#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    last_accepted: HashMap<InputTrigger, Instant>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_accepted: HashMap::new(),
        }
    }

    pub fn accept(&mut self, trigger: InputTrigger, now: Instant) -> bool {
        match self.last_accepted.get(&trigger) {
            Some(last) if now.saturating_duration_since(*last) < self.window => false,
            _ => {
                self.last_accepted.insert(trigger, now);
                true
            }
        }
    }
}

pub fn parse_button(line: &str) -> Option<InputTrigger> {
    match line.trim().to_ascii_lowercase().as_str() {
        "c" | "m" | "mode" => Some(InputTrigger::CycleMode),
        "+" | "u" | "up" => Some(InputTrigger::IncreaseSetPoint),
        "-" | "d" | "down" => Some(InputTrigger::DecreaseSetPoint),
        _ => None,
    }
}

pub struct StdinButtons {
    debouncer: Debouncer,
}

impl StdinButtons {
    pub fn new(bounce: Duration) -> Self {
        Self {
            debouncer: Debouncer::new(bounce),
        }
    }

    pub fn spawn(
        mut self,
        triggers: mpsc::Sender<InputTrigger>,
    ) -> std::io::Result<thread::JoinHandle<()>> {
        thread::Builder::new()
            .name("buttons".to_string())
            .spawn(move || self.run(&triggers))
    }

    fn run(&mut self, triggers: &mpsc::Sender<InputTrigger>) {
        info!("buttons: 'c' cycles mode, '+' raises and '-' lowers the set point");

        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!("stdin read error: {err}");
                    return;
                }
            };

            let Some(trigger) = parse_button(&line) else {
                if !line.trim().is_empty() {
                    warn!("unknown button {:?}", line.trim());
                }
                continue;
            };

            if !self.debouncer.accept(trigger, Instant::now()) {
                debug!("debounced {trigger:?}");
                continue;
            }
            if triggers.blocking_send(trigger).is_err() {
                return;
            }
        }
        info!("stdin closed, buttons disabled");
    }
}
