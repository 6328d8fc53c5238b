//! Tracing subscriber setup.

use anyhow::{anyhow, Result};
use tracing_subscriber::EnvFilter;

use crate::container::LoggingConfig;

/// Install the global subscriber. `RUST_LOG` overrides `config.level`.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    installed.map_err(|e| anyhow!("failed to install tracing subscriber: {}", e))
}
