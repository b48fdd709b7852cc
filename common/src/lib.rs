pub mod cadence;
pub mod config;
pub mod policy;
pub mod thermostat;
pub mod topics;
pub mod types;

pub use cadence::{DisplayCadence, SecondLine, TickPlan};
pub use config::{ConfigError, InitialSettings, RuntimeConfig, ThermostatConfig, TransportConfig};
pub use thermostat::{
    EngineAction, EntryAction, ThermostatEngine, ThermostatSnapshot, Transition, Trigger,
};
pub use topics::*;
pub use types::{Actuator, ActuatorLevel, ActuatorPlan, StatusReport, ThermostatMode};
