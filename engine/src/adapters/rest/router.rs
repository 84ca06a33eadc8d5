//! REST API router

use super::handlers::{self, AppState};
use axum::{
    routing::{get, post},
    Router,
};

/// Build the REST API router
pub fn build_router(manager: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        // Catalog
        .route("/services", get(handlers::list_services))
        .route("/services/:name", get(handlers::describe_service))
        .route(
            "/config/services",
            get(handlers::get_catalog).put(handlers::replace_catalog),
        )
        // Lifecycle
        .route("/service/:name/start", post(handlers::start_service))
        .route("/service/:name/stop", post(handlers::stop_service))
        .route("/service/:name/restart", post(handlers::restart_service))
        .route("/service/:name/status", get(handlers::service_status))
        // Logs
        .route("/logs/:name", get(handlers::list_logs))
        .route(
            "/logs/:name/:file",
            get(handlers::read_log).delete(handlers::clear_log),
        )
        .route("/logs/:name/:file/stream", get(handlers::stream_log))
        .with_state(manager)
}
