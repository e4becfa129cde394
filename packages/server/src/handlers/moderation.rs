use axum::Json;
use axum::extract::State;
use common::job::BatchDeleteSummary;
use tracing::instrument;
use worker::SweepRequest;

use crate::error::AppError;
use crate::extractors::json::AppJson;
use crate::state::AppState;

/// Deletes the replies under a post or comment and returns the batch summary.
///
/// Blocks until the `batch-delete` job has finished.
#[instrument(skip(state, payload), fields(platform = %payload.platform, parent_id = %payload.parent_id))]
pub async fn sweep(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SweepRequest>,
) -> Result<Json<BatchDeleteSummary>, AppError> {
    let summary = state.pipeline.sweeper().sweep(&payload).await?;
    Ok(Json(summary))
}
