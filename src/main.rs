use anyhow::{Context, Result};
use weather_proxy::{ProxyConfig, telemetry, web};

#[tokio::main]
async fn main() -> Result<()> {
    let config = ProxyConfig::load().context("Invalid configuration")?;
    telemetry::init(&config.log_level, &config.log_format)?;

    tracing::info!(version = weather_proxy::VERSION, "Starting weather proxy");
    web::run(config).await
}
