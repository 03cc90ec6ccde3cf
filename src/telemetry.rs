//! Tracing subscriber set-up

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. `RUST_LOG` takes precedence over `level`.
pub fn init(level: &str, format: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .with_context(|| format!("Invalid log level '{level}'"))?;

    let registry = tracing_subscriber::registry().with(filter);

    match format {
        "json" => registry
            .with(fmt::layer().json())
            .try_init()
            .context("Failed to install JSON tracing subscriber")?,
        _ => registry
            .with(fmt::layer())
            .try_init()
            .context("Failed to install tracing subscriber")?,
    }

    Ok(())
}
