use anyhow::Context;
use one_meter_server::{config::Config, init_tracing, start_server};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::load().context("Environment misconfigured")?;
    start_server(config).await.context("Server failed")?;

    Ok(())
}
