use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use thermostat_common::{Actuator, ActuatorLevel, ActuatorPlan};

use crate::ports::{
    ActuatorPair, DisplayPort, SensorError, StatusTransport, TemperatureSource, TransportError,
};

#[derive(Debug, Clone, Copy)]
enum SensorBehavior {
    Reading(f32),
    Fail,
    Hang,
}

#[derive(Clone)]
pub struct MockSensor {
    behavior: Arc<Mutex<SensorBehavior>>,
}

impl MockSensor {
    pub fn reading(temp_f: f32) -> Self {
        Self {
            behavior: Arc::new(Mutex::new(SensorBehavior::Reading(temp_f))),
        }
    }

    pub fn hanging() -> Self {
        Self {
            behavior: Arc::new(Mutex::new(SensorBehavior::Hang)),
        }
    }

    pub fn set(&self, temp_f: f32) {
        *self.behavior.lock().unwrap() = SensorBehavior::Reading(temp_f);
    }

    pub fn fail(&self) {
        *self.behavior.lock().unwrap() = SensorBehavior::Fail;
    }
}

#[async_trait]
impl TemperatureSource for MockSensor {
    async fn read_fahrenheit(&self) -> Result<f32, SensorError> {
        let behavior = *self.behavior.lock().unwrap();
        match behavior {
            SensorBehavior::Reading(temp_f) => Ok(temp_f),
            SensorBehavior::Fail => Err(SensorError::Read("i2c nack".to_string())),
            SensorBehavior::Hang => std::future::pending().await,
        }
    }
}

#[derive(Clone, Default)]
pub struct RecordingActuators {
    calls: Arc<Mutex<Vec<(Actuator, ActuatorLevel)>>>,
}

impl RecordingActuators {
    pub fn calls(&self) -> Vec<(Actuator, ActuatorLevel)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn current(&self) -> ActuatorPlan {
        let mut plan = ActuatorPlan::ALL_OFF;
        for (actuator, level) in self.calls() {
            match actuator {
                Actuator::Heat => plan.heat = level,
                Actuator::Cool => plan.cool = level,
            }
        }
        plan
    }
}

impl ActuatorPair for RecordingActuators {
    fn set(&mut self, actuator: Actuator, level: ActuatorLevel) {
        self.calls.lock().unwrap().push((actuator, level));
    }
}

#[derive(Debug, Default)]
pub struct DisplayLog {
    pub writes: Vec<(String, String)>,
    pub releases: u32,
    pub writes_after_release: u32,
}

#[derive(Clone, Default)]
pub struct RecordingDisplay {
    log: Arc<Mutex<DisplayLog>>,
}

impl RecordingDisplay {
    pub fn writes(&self) -> Vec<(String, String)> {
        self.log.lock().unwrap().writes.clone()
    }

    pub fn second_lines(&self) -> Vec<String> {
        self.writes().into_iter().map(|(_, line2)| line2).collect()
    }

    pub fn releases(&self) -> u32 {
        self.log.lock().unwrap().releases
    }

    pub fn writes_after_release(&self) -> u32 {
        self.log.lock().unwrap().writes_after_release
    }
}

impl DisplayPort for RecordingDisplay {
    fn write(&mut self, line1: &str, line2: &str) {
        let mut log = self.log.lock().unwrap();
        if log.releases > 0 {
            log.writes_after_release += 1;
        }
        log.writes.push((line1.to_string(), line2.to_string()));
    }

    fn release(&mut self) {
        self.log.lock().unwrap().releases += 1;
    }
}

#[derive(Clone, Default)]
pub struct RecordingTransport {
    lines: Arc<Mutex<Vec<String>>>,
    attempts: Arc<Mutex<u32>>,
    failing: Arc<Mutex<bool>>,
    hanging: Arc<Mutex<bool>>,
}

impl RecordingTransport {
    pub fn failing() -> Self {
        let transport = Self::default();
        *transport.failing.lock().unwrap() = true;
        transport
    }

    pub fn hanging() -> Self {
        let transport = Self::default();
        *transport.hanging.lock().unwrap() = true;
        transport
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn attempts(&self) -> u32 {
        *self.attempts.lock().unwrap()
    }
}

#[async_trait]
impl StatusTransport for RecordingTransport {
    async fn write_line(&self, line: &str) -> Result<(), TransportError> {
        *self.attempts.lock().unwrap() += 1;
        let hanging = *self.hanging.lock().unwrap();
        if hanging {
            std::future::pending::<()>().await;
        }
        if *self.failing.lock().unwrap() {
            return Err(TransportError::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "serial port unplugged",
            )));
        }
        self.lines.lock().unwrap().push(line.to_string());
        Ok(())
    }
}
