//! Hit counter server
//!
//! Serves tracking pixels and counter queries over HTTP. See
//! `hit_counter::config` for the environment variables.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use hit_counter::http::{self, AppState};
use hit_counter::observability::init_tracing;
use hit_counter::{store, ServiceConfig, SystemClock};
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = ServiceConfig::load()?;
    init_tracing(&config.log)?;

    info!(
        service = %config.service_name,
        bind = %config.bind_addr,
        backend = ?config.store.backend,
        yearly_window = config.retention.yearly_window,
        monthly_window = config.retention.monthly_window,
        daily_window = config.retention.daily_window,
        max_timestamps = config.retention.max_timestamps,
        "Starting hit counter"
    );
    if config.secret.is_none() {
        warn!("SECRET is not set: deletes will be refused");
    }

    let store = store::open(&config.store)?;
    let state = AppState::new(store, &config, Arc::new(SystemClock));
    let listener = TcpListener::bind(config.bind_addr).await?;

    http::serve(listener, state, shutdown_signal()).await?;
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!(error = %e, "Failed to listen for shutdown signal"),
    }
}
