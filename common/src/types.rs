use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThermostatMode {
    #[default]
    Off,
    Heat,
    Cool,
}

impl ThermostatMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Heat => "heat",
            Self::Cool => "cool",
        }
    }
}

impl fmt::Display for ThermostatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Actuator {
    Heat,
    Cool,
}

impl Actuator {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heat => "heat",
            Self::Cool => "cool",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ActuatorLevel {
    #[default]
    Off,
    Steady,
    Pulsing,
}

impl ActuatorLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Off => "off",
            Self::Steady => "steady",
            Self::Pulsing => "pulsing",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActuatorPlan {
    pub heat: ActuatorLevel,
    pub cool: ActuatorLevel,
}

impl ActuatorPlan {
    pub const ALL_OFF: Self = Self {
        heat: ActuatorLevel::Off,
        cool: ActuatorLevel::Off,
    };

    pub fn level(&self, actuator: Actuator) -> ActuatorLevel {
        match actuator {
            Actuator::Heat => self.heat,
            Actuator::Cool => self.cool,
        }
    }

    /// Actuators whose level in `self` differs from `previous`, in heat/cool order.
    /// With no previous plan every actuator is reported.
    pub fn changes_from(&self, previous: Option<&ActuatorPlan>) -> Vec<(Actuator, ActuatorLevel)> {
        [Actuator::Heat, Actuator::Cool]
            .into_iter()
            .filter(|actuator| {
                previous.map_or(true, |prev| prev.level(*actuator) != self.level(*actuator))
            })
            .map(|actuator| (actuator, self.level(actuator)))
            .collect()
    }
}

/// One status report: `"{mode},{temperature},{set_point}"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusReport {
    pub mode: ThermostatMode,
    pub temperature_f: i32,
    pub set_point_f: i32,
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.mode, self.temperature_f, self.set_point_f)
    }
}

pub fn celsius_to_fahrenheit(celsius: f32) -> f32 {
    celsius * 9.0 / 5.0 + 32.0
}

pub fn floor_fahrenheit(temp_f: f32) -> Option<i32> {
    if !temp_f.is_finite() {
        return None;
    }
    let floored = temp_f.floor();
    if floored < i32::MIN as f32 || floored > i32::MAX as f32 {
        return None;
    }
    Some(floored as i32)
}
