use axum::Json;
use axum::extract::{Path, State};
use tracing::{info, instrument};
use worker::MonitoringStatus;

use crate::error::AppError;
use crate::models::monitoring::StopMonitoringResponse;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn start_monitoring(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<MonitoringStatus>, AppError> {
    let status = state.pipeline.control().start(&tenant_id).await?;
    info!(tenant_id = %tenant_id, "Monitoring started");
    Ok(Json(status))
}

#[instrument(skip(state))]
pub async fn stop_monitoring(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<StopMonitoringResponse>, AppError> {
    let removed_jobs = state.pipeline.control().stop(&tenant_id).await?;
    info!(tenant_id = %tenant_id, removed_jobs, "Monitoring stopped");
    Ok(Json(StopMonitoringResponse {
        tenant_id,
        is_enabled: false,
        removed_jobs,
    }))
}

#[instrument(skip(state))]
pub async fn monitoring_status(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
) -> Result<Json<MonitoringStatus>, AppError> {
    let status = state.pipeline.control().status(&tenant_id).await?;
    Ok(Json(status))
}
