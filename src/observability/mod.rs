//! Observability module for the chaos bot.
//!
//! Installs the `tracing` subscriber that every chaos run logs through.

use crate::config::ObservabilityConfig;
use crate::error::{ChaosError, Result};
use ::tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize logging.
///
/// `RUST_LOG` takes precedence over the configured level. Fails if a global
/// subscriber is already installed.
pub fn init(config: &ObservabilityConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .map_err(|e| ChaosError::Config(format!("Invalid log level {:?}: {}", config.log_level, e)))?;

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| ChaosError::Internal(format!("Failed to init logging: {}", e)))?;
    } else {
        subscriber
            .with(fmt::layer().with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| ChaosError::Internal(format!("Failed to init logging: {}", e)))?;
    }

    info!(level = %config.log_level, json = config.json_logs, "Observability initialized");
    Ok(())
}
