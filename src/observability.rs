//! Tracing setup
//!
//! `RUST_LOG` takes precedence; otherwise the configured level is used.

use crate::config::LogConfig;
use tracing_subscriber::EnvFilter;

/// Install the global tracing subscriber
///
/// Fails if a global subscriber is already installed.
pub fn init_tracing(config: &LogConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if config.json {
        builder.json().try_init()?;
    } else {
        builder.try_init()?;
    }

    tracing::info!(level = %config.level, json = config.json, "Tracing initialized");
    Ok(())
}
