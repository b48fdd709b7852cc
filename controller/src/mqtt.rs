use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use rumqttc::{AsyncClient, Event, EventLoop, Incoming, LastWill, MqttOptions, QoS};
use thermostat_common::{config::MqttConfig, TOPIC_CONTROLLER_AVAILABILITY, TOPIC_CONTROLLER_STATUS};
use tracing::{info, warn};

use crate::ports::{StatusTransport, TransportError};

pub struct MqttTransport {
    client: AsyncClient,
}

impl MqttTransport {
    pub async fn connect(config: &MqttConfig) -> anyhow::Result<Self> {
        let mut options =
            MqttOptions::new("thermostat-controller-rust", config.host.clone(), config.port);
        options.set_keep_alive(Duration::from_secs(30));
        options.set_last_will(LastWill::new(
            TOPIC_CONTROLLER_AVAILABILITY,
            "offline",
            QoS::AtLeastOnce,
            true,
        ));
        if !config.user.is_empty() {
            options.set_credentials(config.user.clone(), config.pass.clone());
        }

        let (client, eventloop) = AsyncClient::new(options, 32);
        client
            .publish(TOPIC_CONTROLLER_AVAILABILITY, QoS::AtLeastOnce, true, "online")
            .await
            .context("failed to publish controller online status")?;

        spawn_mqtt_loop(eventloop);
        info!("status reports go to mqtt {}:{}", config.host, config.port);
        Ok(Self { client })
    }
}

#[async_trait]
impl StatusTransport for MqttTransport {
    async fn write_line(&self, line: &str) -> Result<(), TransportError> {
        self.client
            .publish(TOPIC_CONTROLLER_STATUS, QoS::AtLeastOnce, false, line.to_string())
            .await?;
        Ok(())
    }
}

fn spawn_mqtt_loop(mut eventloop: EventLoop) {
    tokio::spawn(async move {
        loop {
            match eventloop.poll().await {
                Ok(Event::Incoming(Incoming::ConnAck(_))) => {
                    info!("mqtt connected");
                }
                Ok(_) => {}
                Err(err) => {
                    warn!("mqtt poll error: {err}");
                    tokio::time::sleep(Duration::from_secs(2)).await;
                }
            }
        }
    });
}
