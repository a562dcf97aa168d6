//! Review API: queue listing and reviewer decisions.

use axum::{
    extract::{rejection::JsonRejection, rejection::QueryRejection, Extension, Path, Query},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::common::{ExtractionId, Page, PageArgs, PatternId, PipelineError};
use crate::domains::extraction::{ConfidenceBucket, Extraction, ExtractionStatus};
use crate::domains::review::{approve_extraction, list_pending, reject_extraction, PendingFilter};
use crate::domains::source::SourceType;
use crate::server::app::{AppState, REVIEWER_HEADER};
use crate::server::ApiError;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListExtractionsParams {
    pub status: Option<String>,
    pub source_type: Option<String>,
    pub confidence_min: Option<f64>,
    pub confidence_max: Option<f64>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ListExtractionsParams {
    fn filter(&self) -> Result<PendingFilter, PipelineError> {
        let status = self
            .status
            .as_deref()
            .map(str::parse::<ExtractionStatus>)
            .transpose()
            .map_err(|e: anyhow::Error| PipelineError::Validation(format!("status: {}", e)))?;
        let source_type = self
            .source_type
            .as_deref()
            .map(str::parse::<SourceType>)
            .transpose()
            .map_err(|e: anyhow::Error| PipelineError::Validation(format!("sourceType: {}", e)))?;

        Ok(PendingFilter {
            status,
            source_type,
            confidence_min: self.confidence_min,
            confidence_max: self.confidence_max,
        })
    }
}

/// An extraction plus its display bucket.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionView {
    #[serde(flatten)]
    pub extraction: Extraction,
    pub confidence_bucket: ConfidenceBucket,
}

impl From<Extraction> for ExtractionView {
    fn from(extraction: Extraction) -> Self {
        Self {
            confidence_bucket: extraction.bucket(),
            extraction,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ApproveRequest {
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    pub notes: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApproveResponse {
    #[serde(flatten)]
    pub extraction: ExtractionView,
    pub pattern_id: PatternId,
    pub merged: bool,
}

fn parse_id(raw: &str) -> Result<ExtractionId, ApiError> {
    ExtractionId::parse(raw).map_err(|_| {
        ApiError(PipelineError::Validation(format!(
            "'{}' is not a valid extraction id",
            raw
        )))
    })
}

fn reviewer(headers: &HeaderMap) -> Result<String, ApiError> {
    headers
        .get(REVIEWER_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| {
            ApiError(PipelineError::Validation(
                "X-Reviewer header is required".into(),
            ))
        })
}

/// GET /pipeline/extractions
pub async fn list_extractions_handler(
    Extension(state): Extension<AppState>,
    params: Result<Query<ListExtractionsParams>, QueryRejection>,
) -> Result<Json<Page<ExtractionView>>, ApiError> {
    let Query(params) = params.map_err(|e| PipelineError::Validation(e.body_text()))?;
    let filter = params.filter()?;
    let page = PageArgs::new(params.limit, params.offset);

    let page = list_pending(&filter, state.queue_order, page, &state.db_pool).await?;
    Ok(Json(Page {
        items: page.items.into_iter().map(ExtractionView::from).collect(),
        has_more: page.has_more,
        limit: page.limit,
        offset: page.offset,
    }))
}

/// GET /pipeline/extractions/:id
pub async fn get_extraction_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExtractionView>, ApiError> {
    let id = parse_id(&id)?;
    let extraction = Extraction::find_by_id_optional(id, &state.db_pool)
        .await?
        .ok_or_else(|| PipelineError::not_found("extraction", id))?;
    Ok(Json(extraction.into()))
}

/// POST /pipeline/extractions/:id/approve
pub async fn approve_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Option<Json<ApproveRequest>>,
) -> Result<Json<ApproveResponse>, ApiError> {
    let id = parse_id(&id)?;
    let reviewer = reviewer(&headers)?;
    let Json(body) = body.unwrap_or_default();

    let outcome =
        approve_extraction(id, &reviewer, body.notes.as_deref(), &state.db_pool).await?;
    Ok(Json(ApproveResponse {
        extraction: outcome.extraction.into(),
        pattern_id: outcome.pattern_id,
        merged: outcome.merged,
    }))
}

/// POST /pipeline/extractions/:id/reject
pub async fn reject_handler(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Result<Json<RejectRequest>, JsonRejection>,
) -> Result<Json<ExtractionView>, ApiError> {
    let id = parse_id(&id)?;
    let reviewer = reviewer(&headers)?;
    let Json(body) = body.map_err(|e| PipelineError::Validation(e.body_text()))?;

    let rejected = reject_extraction(id, &reviewer, &body.notes, &state.db_pool).await?;
    Ok(Json(rejected.into()))
}
