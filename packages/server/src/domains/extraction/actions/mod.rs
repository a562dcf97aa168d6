//! Extraction store actions.

use sqlx::PgPool;
use tracing::info;

use crate::common::{ExtractionId, PipelineError, PipelineResult, SourceId};
use crate::domains::source::actions::transition_error;
use crate::domains::source::{Source, SourceStatus};

use super::confidence::{score, ScoringConfig};
use super::models::{ExtractedPayload, Extraction, ExtractionStatus};

/// Store a new extraction for a scraped source and move the source to
/// `extracted`, atomically.
pub async fn submit_extraction(
    source_id: SourceId,
    payload: ExtractedPayload,
    scoring: &ScoringConfig,
    pool: &PgPool,
) -> PipelineResult<Extraction> {
    payload.validate_ingress()?;
    let confidence = score(&payload, scoring);

    let mut tx = pool.begin().await?;

    if Source::mark_extracted(source_id, &mut tx).await?.is_none() {
        drop(tx);
        return Err(transition_error(source_id, "extracted", &[SourceStatus::Scraped], pool).await);
    }

    let extraction = Extraction::insert(source_id, &payload, confidence, &mut tx).await?;
    tx.commit().await?;

    info!(
        extraction_id = %extraction.id,
        source_id = %source_id,
        confidence = confidence,
        pattern = ?extraction.pattern_name,
        "Extraction stored"
    );
    Ok(extraction)
}

/// Canonicalize an `extracted` payload and move it to `normalized`.
///
/// Conflict from any other status, or when the row changed after it was read.
pub async fn normalize_extraction(
    id: ExtractionId,
    scoring: &ScoringConfig,
    pool: &PgPool,
) -> PipelineResult<Extraction> {
    let current = Extraction::find_by_id_optional(id, pool)
        .await?
        .ok_or_else(|| PipelineError::not_found("extraction", id))?;
    if current.status()? != ExtractionStatus::Extracted {
        return Err(PipelineError::Conflict(format!(
            "extraction {} is '{}', only 'extracted' can be normalized",
            id, current.status
        )));
    }

    let normalized = current.payload().normalized();
    let confidence = score(&normalized, scoring);

    let updated = Extraction::replace_payload(
        id,
        &normalized,
        confidence,
        &[ExtractionStatus::Extracted],
        ExtractionStatus::Normalized,
        current.updated_at,
        pool,
    )
    .await?
    .ok_or_else(|| changed_concurrently(id))?;

    info!(extraction_id = %id, confidence = confidence, "Extraction normalized");
    Ok(updated)
}

/// Replace a pending extraction's payload (reviewer corrections). The status
/// is kept and the confidence recomputed.
pub async fn update_extraction_payload(
    id: ExtractionId,
    payload: ExtractedPayload,
    scoring: &ScoringConfig,
    pool: &PgPool,
) -> PipelineResult<Extraction> {
    payload.validate_ingress()?;

    let current = Extraction::find_by_id_optional(id, pool)
        .await?
        .ok_or_else(|| PipelineError::not_found("extraction", id))?;
    let status = current.status()?;
    if !ExtractionStatus::PENDING.contains(&status) {
        return Err(not_pending(id, &current.status));
    }

    let confidence = score(&payload, scoring);
    let updated = Extraction::replace_payload(
        id,
        &payload,
        confidence,
        &[status],
        status,
        current.updated_at,
        pool,
    )
    .await?
    .ok_or_else(|| changed_concurrently(id))?;

    info!(extraction_id = %id, confidence = confidence, "Extraction payload updated");
    Ok(updated)
}

fn changed_concurrently(id: ExtractionId) -> PipelineError {
    PipelineError::Conflict(format!(
        "extraction {} changed concurrently; refetch before retrying",
        id
    ))
}

fn not_pending(id: ExtractionId, status: &str) -> PipelineError {
    PipelineError::Conflict(format!(
        "extraction {} is no longer pending review ({})",
        id, status
    ))
}
