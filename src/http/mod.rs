//! HTTP surface
//!
//! | Route | Response |
//! |-------|----------|
//! | `GET /` | `{"name": <service name>}` |
//! | `GET /hit/{namespace}/{resource}` | 200 SVG pixel, always |
//! | `GET /~/counts/{namespace}` | `{resource: total, ...}` |
//! | `GET /~/value/{namespace}/{resource}` | record tuple or 404 |
//! | `DELETE /~/delete/{namespace}/{resource}?secret=` | `{"message": "Deleted", ...}` |
//!
//! Anything else answers 404 `{"message": "Not found"}`.

mod error;
mod handlers;
mod pixel;

pub use error::ApiError;
pub use pixel::{Pixel, NO_CACHE, SVG_CONTENT_TYPE};

use crate::clock::Clock;
use crate::config::ServiceConfig;
use crate::counter::{QuerySurface, UpdateEngine};
use crate::store::CounterStore;
use axum::routing::{delete, get};
use axum::Router;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

/// Shared per-process state handed to every handler
#[derive(Clone)]
pub struct AppState {
    engine: UpdateEngine,
    query: QuerySurface,
    clock: Arc<dyn Clock>,
    service_name: Arc<str>,
    secret: Option<Arc<str>>,
    required_user_agent: Option<Arc<str>>,
}

impl AppState {
    /// Wire the engine and query surface to one shared store
    pub fn new(store: CounterStore, config: &ServiceConfig, clock: Arc<dyn Clock>) -> Self {
        AppState {
            engine: UpdateEngine::new(store.clone(), config.retention),
            query: QuerySurface::new(store),
            clock,
            service_name: Arc::from(config.service_name.as_str()),
            secret: config.secret.as_deref().map(Arc::from),
            required_user_agent: config.required_user_agent.as_deref().map(Arc::from),
        }
    }
}

/// Build the router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::identity))
        .route("/hit/{namespace}/{resource}", get(handlers::hit))
        .route("/~/counts/{namespace}", get(handlers::counts))
        .route("/~/value/{namespace}/{resource}", get(handlers::value))
        .route(
            "/~/delete/{namespace}/{resource}",
            delete(handlers::delete_record),
        )
        .fallback(handlers::not_found)
        .method_not_allowed_fallback(handlers::not_found)
        .with_state(state)
}

/// Serve until `shutdown` resolves
pub async fn serve<F>(listener: TcpListener, state: AppState, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    info!(addr = ?listener.local_addr().ok(), "HTTP server listening");
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}
