//! Application setup and server configuration.

use axum::{
    extract::Extension,
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::routes::{health_handler, sync_all_kbo_data_handler, sync_kbo_data_handler};

/// Build the Axum application router
///
/// The same `ServerDeps` instance is shared with the scheduler so both
/// trigger paths use one set of per-organization locks and one sweep guard.
pub fn build_app(deps: ServerDeps) -> Router {
    Router::new()
        .route("/sync-kbo-data/:id", post(sync_kbo_data_handler))
        .route("/sync-all-kbo-data", post(sync_all_kbo_data_handler))
        .route("/health", get(health_handler))
        .layer(Extension(deps))
        .layer(TraceLayer::new_for_http())
}
