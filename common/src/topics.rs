pub const TOPIC_CONTROLLER_STATUS: &str = "thermostat/controller/status";
pub const TOPIC_CONTROLLER_AVAILABILITY: &str = "thermostat/controller/availability";
