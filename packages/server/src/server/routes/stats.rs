use axum::{extract::Extension, Json};

use crate::domains::stats::PipelineStats;
use crate::server::{ApiError, AppState};

pub async fn stats_handler(
    Extension(state): Extension<AppState>,
) -> Result<Json<PipelineStats>, ApiError> {
    Ok(Json(PipelineStats::load(&state.db_pool).await?))
}
