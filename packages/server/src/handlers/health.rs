use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use crate::models::health::{HealthResponse, HealthStatus};
use crate::state::AppState;

/// Queue counts per state plus scheduler liveness. 503 once the queue is closed.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let pipeline = state.pipeline.health().await;
    let status = HealthStatus::of(&pipeline);
    let code = match status {
        HealthStatus::Down => StatusCode::SERVICE_UNAVAILABLE,
        HealthStatus::Ok | HealthStatus::Degraded => StatusCode::OK,
    };
    (code, Json(HealthResponse { status, pipeline }))
}
