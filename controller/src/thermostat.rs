use std::{sync::Arc, time::Duration};

use thermostat_common::{
    EngineAction, StatusReport, ThermostatEngine, ThermostatSnapshot, Transition, Trigger,
};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::ports::{read_with_deadline, ActuatorPair, TemperatureSource};

struct Core {
    engine: ThermostatEngine,
    actuators: Box<dyn ActuatorPair>,
}

#[derive(Clone)]
pub struct Thermostat {
    core: Arc<Mutex<Core>>,
    sensor: Arc<dyn TemperatureSource>,
    sensor_timeout: Duration,
}

impl Thermostat {
    pub fn new(
        engine: ThermostatEngine,
        actuators: Box<dyn ActuatorPair>,
        sensor: Arc<dyn TemperatureSource>,
        sensor_timeout: Duration,
    ) -> Self {
        Self {
            core: Arc::new(Mutex::new(Core { engine, actuators })),
            sensor,
            sensor_timeout,
        }
    }

    pub async fn sample(&self) -> Option<f32> {
        match read_with_deadline(self.sensor.as_ref(), self.sensor_timeout).await {
            Ok(temp_f) if temp_f.is_finite() => Some(temp_f),
            Ok(temp_f) => {
                warn!("discarding non-finite temperature reading {temp_f}");
                None
            }
            Err(err) => {
                warn!("temperature read failed: {err}");
                None
            }
        }
    }

    pub async fn apply(&self, trigger: Trigger) -> Transition {
        let reading = self.sample().await;

        let mut core = self.core.lock().await;
        let (transition, actions) = core.engine.apply(trigger, reading);
        if transition.from != transition.to {
            info!(
                "mode {} -> {} (entry {:?})",
                transition.from, transition.to, transition.entry
            );
        }
        debug!(
            "after {trigger:?}: mode={} set_point={}F temp={}F",
            core.engine.mode(),
            core.engine.set_point_f(),
            core.engine.temperature_f()
        );
        execute_engine_actions(core.actuators.as_mut(), actions);
        transition
    }

    pub async fn cycle_mode(&self) -> Transition {
        self.apply(Trigger::CycleMode).await
    }

    pub async fn increase_set_point(&self) {
        self.apply(Trigger::IncreaseSetPoint).await;
    }

    pub async fn decrease_set_point(&self) {
        self.apply(Trigger::DecreaseSetPoint).await;
    }

    pub async fn reevaluate(&self) {
        let reading = self.sample().await;
        self.reevaluate_with(reading).await;
    }

    pub async fn reevaluate_with(&self, reading: Option<f32>) {
        let mut core = self.core.lock().await;
        let actions = core.engine.reevaluate(reading);
        execute_engine_actions(core.actuators.as_mut(), actions);
    }

    pub async fn status_report(&self, reading: Option<f32>) -> StatusReport {
        self.core.lock().await.engine.status_report(reading)
    }

    pub async fn status_line(&self) -> String {
        let reading = self.sample().await;
        self.status_report(reading).await.to_string()
    }

    pub async fn snapshot(&self) -> ThermostatSnapshot {
        self.core.lock().await.engine.snapshot()
    }
}

fn execute_engine_actions(actuators: &mut dyn ActuatorPair, actions: Vec<EngineAction>) {
    for action in actions {
        match action {
            EngineAction::SetActuator { actuator, level } => actuators.set(actuator, level),
        }
    }
}
