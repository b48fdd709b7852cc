use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{debug, info};

use crate::thermostat::Thermostat;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputTrigger {
    CycleMode,
    IncreaseSetPoint,
    DecreaseSetPoint,
}

#[derive(Clone)]
pub struct InputDispatcher {
    thermostat: Thermostat,
}

impl InputDispatcher {
    pub fn new(thermostat: Thermostat) -> Self {
        Self { thermostat }
    }

    /// Runs the bound operation, indicator update included, before returning.
    pub async fn dispatch(&self, trigger: InputTrigger) {
        debug!("input trigger {trigger:?}");
        match trigger {
            InputTrigger::CycleMode => {
                self.thermostat.cycle_mode().await;
            }
            InputTrigger::IncreaseSetPoint => self.thermostat.increase_set_point().await,
            InputTrigger::DecreaseSetPoint => self.thermostat.decrease_set_point().await,
        }
    }

    pub async fn run(self, mut triggers: mpsc::Receiver<InputTrigger>) {
        while let Some(trigger) = triggers.recv().await {
            self.dispatch(trigger).await;
        }
        info!("input channel closed, dispatcher stopped");
    }

    pub fn spawn(self, triggers: mpsc::Receiver<InputTrigger>) -> JoinHandle<()> {
        tokio::spawn(self.run(triggers))
    }
}
