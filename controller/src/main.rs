mod adapters;
mod host;
mod input;
mod mqtt;
mod ports;
mod status_task;
#[cfg(test)]
mod testing;
mod thermostat;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    host::run().await
}
