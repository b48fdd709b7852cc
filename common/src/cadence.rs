use chrono::{DateTime, TimeZone};

use crate::types::ThermostatMode;

pub const ALTERNATION_TICKS: u8 = 10;
pub const TEMPERATURE_TICKS: u8 = 5;
pub const CLOCK_FORMAT: &str = "%m/%d %H:%M:%S";
pub const TEMP_ERROR_LINE: &str = "Temp Error";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondLine {
    Temperature,
    ModeSetPoint,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    pub second_line: SecondLine,
    pub reevaluate: bool,
    pub report: bool,
}

impl TickPlan {
    pub fn needs_reading(&self) -> bool {
        self.second_line == SecondLine::Temperature || self.reevaluate || self.report
    }
}

#[derive(Debug, Clone)]
pub struct DisplayCadence {
    tick: u32,
    alternation: u8,
    report_every_ticks: u32,
}

impl DisplayCadence {
    pub fn new(report_every_ticks: u32) -> Self {
        Self {
            tick: 1,
            alternation: 1,
            report_every_ticks: report_every_ticks.max(1),
        }
    }

    pub fn advance(&mut self) -> TickPlan {
        let second_line = if self.alternation <= TEMPERATURE_TICKS {
            SecondLine::Temperature
        } else {
            SecondLine::ModeSetPoint
        };
        let reevaluate = self.alternation >= ALTERNATION_TICKS;
        self.alternation = if reevaluate { 1 } else { self.alternation + 1 };

        let report = self.tick >= self.report_every_ticks;
        self.tick = if report { 1 } else { self.tick + 1 };

        TickPlan {
            second_line,
            reevaluate,
            report,
        }
    }
}

pub fn clock_line<Tz>(now: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    now.format(CLOCK_FORMAT).to_string()
}

pub fn temperature_line(temperature_f: Option<i32>) -> String {
    match temperature_f {
        Some(temp) => format!("Temp: {temp}F"),
        None => TEMP_ERROR_LINE.to_string(),
    }
}

pub fn mode_line(mode: ThermostatMode, set_point_f: i32) -> String {
    format!("{mode} {set_point_f}F")
}

pub fn fit_to_width(line: &str, columns: usize) -> String {
    line.chars().take(columns).collect()
}
