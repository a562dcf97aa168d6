//! Reviewer decisions.
//!
//! Both actions are conditional updates on the extraction row: only a row
//! still in a pending status moves, so of two concurrent decisions on the
//! same extraction exactly one succeeds and the other sees `Conflict`.

use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use crate::common::{ExtractionId, PatternId, PipelineError, PipelineResult};
use crate::domains::extraction::{Extraction, ExtractionStatus};
use crate::domains::ingestion::{ingest_extraction, IngestAction};

/// Result of a successful approval: the extraction after ingestion and the
/// catalog pattern it landed in.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalOutcome {
    pub extraction: Extraction,
    pub pattern_id: PatternId,
    pub merged: bool,
}

fn require_reviewer(reviewer: &str) -> PipelineResult<&str> {
    let reviewer = reviewer.trim();
    if reviewer.is_empty() {
        return Err(PipelineError::Validation("reviewer is required".into()));
    }
    Ok(reviewer)
}

fn clean_notes(notes: Option<&str>) -> Option<&str> {
    notes.map(str::trim).filter(|n| !n.is_empty())
}

async fn pending_extraction(id: ExtractionId, pool: &PgPool) -> PipelineResult<Extraction> {
    let extraction = Extraction::find_by_id_optional(id, pool)
        .await?
        .ok_or_else(|| PipelineError::not_found("extraction", id))?;
    if !ExtractionStatus::PENDING.contains(&extraction.status()?) {
        return Err(already_reviewed(id, &extraction.status));
    }
    Ok(extraction)
}

fn already_reviewed(id: ExtractionId, status: &str) -> PipelineError {
    PipelineError::Conflict(format!(
        "extraction {} is already '{}'; refetch before acting",
        id, status
    ))
}

/// Lost the conditional update: report the status the winner left behind.
async fn lost_race(id: ExtractionId, pool: &PgPool) -> PipelineError {
    match Extraction::find_by_id_optional(id, pool).await {
        Ok(Some(current)) if ExtractionStatus::PENDING.iter().any(|s| s.as_str() == current.status) => {
            PipelineError::Conflict(format!(
                "extraction {} changed while under review; refetch before acting",
                id
            ))
        }
        Ok(Some(current)) => already_reviewed(id, &current.status),
        Ok(None) => PipelineError::not_found("extraction", id),
        Err(e) => PipelineError::Internal(e),
    }
}

/// Approve a pending extraction and ingest it.
///
/// A validation failure leaves the status untouched. The transition only
/// applies to the payload that was validated; a concurrent payload edit
/// turns it into a `Conflict`. Once approved, an
/// ingestion failure (for example `DuplicateIdentity`) is returned to the
/// reviewer and the extraction stays `approved`.
pub async fn approve_extraction(
    id: ExtractionId,
    reviewer: &str,
    notes: Option<&str>,
    pool: &PgPool,
) -> PipelineResult<ApprovalOutcome> {
    let reviewer = require_reviewer(reviewer)?;
    let extraction = pending_extraction(id, pool).await?;
    extraction.payload().validate_for_approval()?;

    let approved = Extraction::transition_reviewed(
        id,
        ExtractionStatus::PENDING,
        ExtractionStatus::Approved,
        reviewer,
        clean_notes(notes),
        Some(extraction.updated_at),
        pool,
    )
    .await?;
    if approved.is_none() {
        return Err(lost_race(id, pool).await);
    }

    info!(extraction_id = %id, reviewer = %reviewer, "Extraction approved");

    let ingestion = ingest_extraction(id, pool).await?;
    Ok(ApprovalOutcome {
        pattern_id: ingestion.pattern.id,
        merged: ingestion.action == IngestAction::Merged,
        extraction: ingestion.extraction,
    })
}

/// Reject a pending extraction. Terminal; notes are required.
pub async fn reject_extraction(
    id: ExtractionId,
    reviewer: &str,
    notes: &str,
    pool: &PgPool,
) -> PipelineResult<Extraction> {
    let reviewer = require_reviewer(reviewer)?;
    let notes = clean_notes(Some(notes))
        .ok_or_else(|| PipelineError::Validation("rejection notes are required".into()))?;

    let rejected = match Extraction::transition_reviewed(
        id,
        ExtractionStatus::PENDING,
        ExtractionStatus::Rejected,
        reviewer,
        Some(notes),
        None,
        pool,
    )
    .await?
    {
        Some(extraction) => extraction,
        None => return Err(lost_race(id, pool).await),
    };

    info!(extraction_id = %id, reviewer = %reviewer, notes = %notes, "Extraction rejected");
    Ok(rejected)
}
