use crate::{
    config::InitialSettings,
    policy,
    types::{Actuator, ActuatorLevel, ActuatorPlan, StatusReport, ThermostatMode},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    CycleMode,
    IncreaseSetPoint,
    DecreaseSetPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryAction {
    PulseHeat,
    PulseCool,
    AllOff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: ThermostatMode,
    pub to: ThermostatMode,
    pub entry: Option<EntryAction>,
}

/// Transition table. Only `CycleMode` changes the mode, along Off -> Heat -> Cool -> Off.
pub fn transition(mode: ThermostatMode, trigger: Trigger) -> Transition {
    let (to, entry) = match (mode, trigger) {
        (ThermostatMode::Off, Trigger::CycleMode) => {
            (ThermostatMode::Heat, Some(EntryAction::PulseHeat))
        }
        (ThermostatMode::Heat, Trigger::CycleMode) => {
            (ThermostatMode::Cool, Some(EntryAction::PulseCool))
        }
        (ThermostatMode::Cool, Trigger::CycleMode) => {
            (ThermostatMode::Off, Some(EntryAction::AllOff))
        }
        (mode, Trigger::IncreaseSetPoint | Trigger::DecreaseSetPoint) => (mode, None),
    };

    Transition {
        from: mode,
        to,
        entry,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineAction {
    SetActuator {
        actuator: Actuator,
        level: ActuatorLevel,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThermostatSnapshot {
    pub mode: ThermostatMode,
    pub set_point_f: i32,
    pub temperature_f: i32,
    pub plan: Option<ActuatorPlan>,
}

#[derive(Debug, Clone)]
pub struct ThermostatEngine {
    mode: ThermostatMode,
    set_point_f: i32,
    // None when the most recent sample failed.
    reading_f: Option<f32>,
    driven: Option<ActuatorPlan>,
}

impl ThermostatEngine {
    pub fn new(settings: InitialSettings) -> Self {
        Self {
            mode: settings.mode,
            set_point_f: settings.set_point_f,
            reading_f: None,
            driven: None,
        }
    }

    pub fn mode(&self) -> ThermostatMode {
        self.mode
    }

    pub fn set_point_f(&self) -> i32 {
        self.set_point_f
    }

    pub fn reading_f(&self) -> Option<f32> {
        self.reading_f
    }

    pub fn temperature_f(&self) -> i32 {
        policy::effective_temperature(self.reading_f, self.set_point_f)
    }

    pub fn driven_plan(&self) -> Option<ActuatorPlan> {
        self.driven
    }

    pub fn snapshot(&self) -> ThermostatSnapshot {
        ThermostatSnapshot {
            mode: self.mode,
            set_point_f: self.set_point_f,
            temperature_f: self.temperature_f(),
            plan: self.driven,
        }
    }

    pub fn apply(&mut self, trigger: Trigger, reading_f: Option<f32>) -> (Transition, Vec<EngineAction>) {
        let transition = transition(self.mode, trigger);
        self.mode = transition.to;

        match trigger {
            Trigger::IncreaseSetPoint => self.set_point_f = self.set_point_f.saturating_add(1),
            Trigger::DecreaseSetPoint => self.set_point_f = self.set_point_f.saturating_sub(1),
            Trigger::CycleMode => {}
        }

        let actions = self.reevaluate(reading_f);
        (transition, actions)
    }

    pub fn cycle_mode(&mut self, reading_f: Option<f32>) -> (Transition, Vec<EngineAction>) {
        self.apply(Trigger::CycleMode, reading_f)
    }

    pub fn increase_set_point(&mut self, reading_f: Option<f32>) -> Vec<EngineAction> {
        self.apply(Trigger::IncreaseSetPoint, reading_f).1
    }

    pub fn decrease_set_point(&mut self, reading_f: Option<f32>) -> Vec<EngineAction> {
        self.apply(Trigger::DecreaseSetPoint, reading_f).1
    }

    pub fn reevaluate(&mut self, reading_f: Option<f32>) -> Vec<EngineAction> {
        self.reading_f = reading_f.filter(|value| value.is_finite());

        let plan = policy::evaluate(self.mode, self.set_point_f, self.temperature_f());
        let actions = plan
            .changes_from(self.driven.as_ref())
            .into_iter()
            .map(|(actuator, level)| EngineAction::SetActuator { actuator, level })
            .collect();
        self.driven = Some(plan);
        actions
    }

    pub fn status_report(&self, reading_f: Option<f32>) -> StatusReport {
        StatusReport {
            mode: self.mode,
            temperature_f: policy::effective_temperature(reading_f, self.set_point_f),
            set_point_f: self.set_point_f,
        }
    }
}

impl Default for ThermostatEngine {
    fn default() -> Self {
        Self::new(InitialSettings::default())
    }
}
