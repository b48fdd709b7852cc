use std::{sync::Arc, time::Duration};

use chrono::{Local, Utc};
use chrono_tz::Tz;
use thermostat_common::{
    cadence::{self, DisplayCadence, SecondLine, TickPlan},
    types::floor_fahrenheit,
    ThermostatConfig,
};
use tokio::{
    sync::watch,
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{debug, info, warn};

use crate::{
    ports::{write_with_deadline, DisplayPort, StatusTransport},
    thermostat::Thermostat,
};

/// Process-wide stop signal for the status task. Set once, never cleared.
#[derive(Debug)]
pub struct TerminationFlag {
    tx: watch::Sender<bool>,
}

impl TerminationFlag {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(false);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    pub fn set(&self) {
        self.tx.send_replace(true);
    }
}

impl Default for TerminationFlag {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases the display when dropped, whether or not the task ever ran.
struct DisplayLease {
    display: Box<dyn DisplayPort>,
}

impl DisplayLease {
    fn write(&mut self, line1: &str, line2: &str) {
        self.display.write(line1, line2);
    }
}

impl Drop for DisplayLease {
    fn drop(&mut self) {
        self.display.release();
        info!("display released");
    }
}

pub struct StatusTask {
    thermostat: Thermostat,
    display: DisplayLease,
    transport: Arc<dyn StatusTransport>,
    timezone: Option<Tz>,
    config: ThermostatConfig,
}

impl StatusTask {
    pub fn new(
        thermostat: Thermostat,
        display: Box<dyn DisplayPort>,
        transport: Arc<dyn StatusTransport>,
        timezone: Option<Tz>,
        config: ThermostatConfig,
    ) -> Self {
        Self {
            thermostat,
            display: DisplayLease { display },
            transport,
            timezone,
            config,
        }
    }

    pub fn spawn(self, termination: &TerminationFlag) -> JoinHandle<()> {
        tokio::spawn(self.run(termination.subscribe()))
    }

    pub async fn run(self, mut terminate: watch::Receiver<bool>) {
        let Self {
            thermostat,
            mut display,
            transport,
            timezone,
            config,
        } = self;
        let ticker = Ticker {
            thermostat,
            transport,
            timezone,
            columns: config.display_columns,
            transport_timeout: Duration::from_millis(config.transport_timeout_ms),
        };

        let mut cadence = DisplayCadence::new(config.report_every_ticks);
        let mut interval = tokio::time::interval(Duration::from_millis(config.tick_ms));
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!("status task started");
        loop {
            if *terminate.borrow_and_update() {
                break;
            }

            tokio::select! {
                biased;
                changed = terminate.changed() => {
                    if changed.is_err() {
                        warn!("termination flag dropped, stopping status task");
                        break;
                    }
                    continue;
                }
                _ = interval.tick() => {}
            }

            let plan = cadence.advance();
            tokio::select! {
                biased;
                changed = terminate.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
                _ = ticker.tick(plan, &mut display) => {}
            }
        }
        info!("status task stopping");
    }
}

struct Ticker {
    thermostat: Thermostat,
    transport: Arc<dyn StatusTransport>,
    timezone: Option<Tz>,
    columns: usize,
    transport_timeout: Duration,
}

impl Ticker {
    async fn tick(&self, plan: TickPlan, display: &mut DisplayLease) {
        let reading = if plan.needs_reading() {
            self.thermostat.sample().await
        } else {
            None
        };

        let line1 = self.clock_line();
        let line2 = match plan.second_line {
            SecondLine::Temperature => cadence::temperature_line(reading.and_then(floor_fahrenheit)),
            SecondLine::ModeSetPoint => {
                let snapshot = self.thermostat.snapshot().await;
                cadence::mode_line(snapshot.mode, snapshot.set_point_f)
            }
        };

        if plan.reevaluate {
            self.thermostat.reevaluate_with(reading).await;
        }

        display.write(
            &cadence::fit_to_width(&line1, self.columns),
            &cadence::fit_to_width(&line2, self.columns),
        );

        if plan.report {
            let report = self.thermostat.status_report(reading).await;
            let line = report.to_string();
            match write_with_deadline(self.transport.as_ref(), &line, self.transport_timeout).await {
                Ok(()) => debug!("status sent: {line}"),
                Err(err) => warn!("status report dropped: {err}"),
            }
        }
    }

    fn clock_line(&self) -> String {
        match self.timezone {
            Some(tz) => cadence::clock_line(&Utc::now().with_timezone(&tz)),
            None => cadence::clock_line(&Local::now()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use thermostat_common::{ActuatorLevel, InitialSettings, ThermostatEngine, ThermostatMode};
    use tokio::time::{sleep, timeout};

    use super::*;
    use crate::testing::{MockSensor, RecordingActuators, RecordingDisplay, RecordingTransport};

    struct Harness {
        sensor: MockSensor,
        actuators: RecordingActuators,
        display: RecordingDisplay,
        transport: RecordingTransport,
        thermostat: Thermostat,
        termination: TerminationFlag,
        handle: JoinHandle<()>,
    }

    fn start(transport: RecordingTransport) -> Harness {
        let sensor = MockSensor::reading(70.4);
        let actuators = RecordingActuators::default();
        let display = RecordingDisplay::default();
        let thermostat = Thermostat::new(
            ThermostatEngine::new(InitialSettings::default()),
            Box::new(actuators.clone()),
            Arc::new(sensor.clone()),
            Duration::from_millis(500),
        );
        let termination = TerminationFlag::new();
        let handle = StatusTask::new(
            thermostat.clone(),
            Box::new(display.clone()),
            Arc::new(transport.clone()),
            Some(chrono_tz::America::New_York),
            ThermostatConfig::default(),
        )
        .spawn(&termination);

        Harness {
            sensor,
            actuators,
            display,
            transport,
            thermostat,
            termination,
            handle,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn one_display_write_per_tick_and_one_report_per_thirty() {
        let harness = start(RecordingTransport::default());

        // Ticks fire at 0s, 1s, ..., 29s.
        sleep(Duration::from_millis(29_500)).await;
        assert_eq!(harness.display.writes().len(), 30);
        assert_eq!(harness.transport.lines(), vec!["off,70,72".to_string()]);

        sleep(Duration::from_millis(30_000)).await;
        assert_eq!(harness.display.writes().len(), 60);
        assert_eq!(harness.transport.lines().len(), 2);

        harness.termination.set();
        harness.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn second_line_alternates_between_temperature_and_mode() {
        let harness = start(RecordingTransport::default());
        harness.thermostat.cycle_mode().await;

        sleep(Duration::from_millis(10_500)).await;
        let lines = harness.display.second_lines();
        assert_eq!(&lines[..5], vec!["Temp: 70F"; 5].as_slice());
        assert_eq!(&lines[5..10], vec!["heat 72F"; 5].as_slice());
        assert_eq!(lines[10], "Temp: 70F");

        let (line1, _) = &harness.display.writes()[0];
        assert_eq!(line1.len(), 14);
        assert_eq!(&line1[2..3], "/");

        harness.termination.set();
        harness.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn tenth_tick_reevaluates_indicators() {
        let harness = start(RecordingTransport::default());
        harness.thermostat.cycle_mode().await;
        assert_eq!(harness.actuators.current().heat, ActuatorLevel::Pulsing);

        // Room warms up; nothing changes until the tenth tick.
        sleep(Duration::from_millis(500)).await;
        harness.sensor.set(75.0);
        sleep(Duration::from_millis(8_000)).await;
        assert_eq!(harness.actuators.current().heat, ActuatorLevel::Pulsing);

        sleep(Duration::from_millis(1_000)).await;
        assert_eq!(harness.actuators.current().heat, ActuatorLevel::Steady);

        harness.termination.set();
        harness.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn sensor_failure_shows_error_for_one_tick_only() {
        let harness = start(RecordingTransport::default());
        harness.sensor.fail();

        sleep(Duration::from_millis(500)).await;
        harness.sensor.set(70.4);
        sleep(Duration::from_millis(1_000)).await;

        assert_eq!(
            harness.display.second_lines(),
            vec!["Temp Error".to_string(), "Temp: 70F".to_string()]
        );
        let snapshot = harness.thermostat.snapshot().await;
        assert_eq!(snapshot.mode, ThermostatMode::Off);
        assert_eq!(snapshot.set_point_f, 72);
        assert!(!harness.handle.is_finished());

        harness.termination.set();
        harness.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn transport_failure_keeps_ticking() {
        let harness = start(RecordingTransport::failing());

        sleep(Duration::from_millis(60_500)).await;
        assert_eq!(harness.transport.attempts(), 2);
        assert_eq!(harness.display.writes().len(), 61);
        assert!(!harness.handle.is_finished());

        harness.termination.set();
        harness.handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn termination_stops_within_one_tick_and_releases_once() {
        let harness = start(RecordingTransport::default());
        sleep(Duration::from_millis(3_500)).await;

        harness.termination.set();
        timeout(Duration::from_millis(1_000), harness.handle)
            .await
            .expect("status task did not stop within one tick")
            .unwrap();

        let writes = harness.display.writes().len();
        sleep(Duration::from_millis(5_000)).await;
        assert_eq!(harness.display.writes().len(), writes);
        assert_eq!(harness.display.releases(), 1);
        assert_eq!(harness.display.writes_after_release(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn termination_interrupts_a_hung_tick() {
        let sensor = MockSensor::hanging();
        let display = RecordingDisplay::default();
        let thermostat = Thermostat::new(
            ThermostatEngine::default(),
            Box::new(RecordingActuators::default()),
            Arc::new(sensor),
            Duration::from_millis(900),
        );
        let termination = TerminationFlag::new();
        let handle = StatusTask::new(
            thermostat,
            Box::new(display.clone()),
            Arc::new(RecordingTransport::default()),
            None,
            ThermostatConfig::default(),
        )
        .spawn(&termination);

        sleep(Duration::from_millis(100)).await;
        termination.set();
        timeout(Duration::from_millis(1_000), handle)
            .await
            .expect("status task did not stop")
            .unwrap();

        assert!(display.writes().is_empty());
        assert_eq!(display.releases(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_before_first_poll_releases_display() {
        let harness = start(RecordingTransport::default());

        harness.handle.abort();
        assert!(harness.handle.await.unwrap_err().is_cancelled());
        assert!(harness.display.writes().is_empty());
        assert_eq!(harness.display.releases(), 1);
    }

    #[tokio::test]
    async fn dropping_an_unspawned_task_releases_display() {
        let display = RecordingDisplay::default();
        let task = StatusTask::new(
            Thermostat::new(
                ThermostatEngine::default(),
                Box::new(RecordingActuators::default()),
                Arc::new(MockSensor::reading(70.0)),
                Duration::from_millis(500),
            ),
            Box::new(display.clone()),
            Arc::new(RecordingTransport::default()),
            None,
            ThermostatConfig::default(),
        );

        drop(task);
        assert_eq!(display.releases(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn abort_still_releases_display() {
        let harness = start(RecordingTransport::default());
        sleep(Duration::from_millis(2_500)).await;

        harness.handle.abort();
        assert!(harness.handle.await.unwrap_err().is_cancelled());
        assert_eq!(harness.display.releases(), 1);
    }
}
