use axum::Json;
use axum::extract::{Path, State};
use tracing::instrument;

use crate::error::AppError;
use crate::extractors::query::AppQuery;
use crate::models::tenant::{SuspiciousListResponse, SuspiciousQuery};
use crate::state::AppState;

#[instrument(skip(state, query))]
pub async fn list_suspicious(
    State(state): State<AppState>,
    Path(tenant_id): Path<String>,
    AppQuery(query): AppQuery<SuspiciousQuery>,
) -> Result<Json<SuspiciousListResponse>, AppError> {
    let threshold = query.threshold()?;
    let comments = state
        .comments
        .find_suspicious(&tenant_id, threshold)
        .await?;

    Ok(Json(SuspiciousListResponse {
        tenant_id,
        threshold,
        count: comments.len(),
        comments,
    }))
}
