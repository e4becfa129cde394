use axum::{
    Router,
    routing::{get, post},
};

use crate::handlers;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/moderation", moderation_routes())
        .nest("/monitoring", monitoring_routes())
        .nest("/tenants", tenant_routes())
}

fn moderation_routes() -> Router<AppState> {
    Router::new().route("/sweep", post(handlers::moderation::sweep))
}

fn monitoring_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{tenant_id}/start",
            post(handlers::monitoring::start_monitoring),
        )
        .route("/{tenant_id}/stop", post(handlers::monitoring::stop_monitoring))
        .route(
            "/{tenant_id}/status",
            get(handlers::monitoring::monitoring_status),
        )
}

fn tenant_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/{tenant_id}/suspicious",
            get(handlers::tenant::list_suspicious),
        )
        .route("/{tenant_id}/events", get(handlers::events::stream_events))
}
