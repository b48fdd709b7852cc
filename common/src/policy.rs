use crate::types::{ActuatorLevel, ActuatorPlan, ThermostatMode};

/// Evaluates the indicator plan. A temperature equal to the set point counts as satisfied.
pub fn evaluate(mode: ThermostatMode, set_point_f: i32, temperature_f: i32) -> ActuatorPlan {
    match mode {
        ThermostatMode::Off => ActuatorPlan::ALL_OFF,
        ThermostatMode::Heat => ActuatorPlan {
            heat: if temperature_f < set_point_f {
                ActuatorLevel::Pulsing
            } else {
                ActuatorLevel::Steady
            },
            cool: ActuatorLevel::Off,
        },
        ThermostatMode::Cool => ActuatorPlan {
            heat: ActuatorLevel::Off,
            cool: if temperature_f > set_point_f {
                ActuatorLevel::Pulsing
            } else {
                ActuatorLevel::Steady
            },
        },
    }
}

pub fn effective_temperature(reading_f: Option<f32>, set_point_f: i32) -> i32 {
    reading_f
        .and_then(crate::types::floor_fahrenheit)
        .unwrap_or(set_point_f)
}
