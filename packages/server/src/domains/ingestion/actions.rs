use serde::Serialize;
use sqlx::PgPool;
use tracing::info;

use crate::common::{ExtractionId, PatternId, PipelineResult};
use crate::domains::extraction::{Extraction, ExtractionStatus};

use super::engine::{ingest_extraction, IngestAction};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestedItem {
    pub extraction_id: ExtractionId,
    pub pattern_id: PatternId,
    pub merged: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestFailure {
    pub extraction_id: ExtractionId,
    pub kind: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryIngestReport {
    pub attempted: usize,
    pub ingested: Vec<IngestedItem>,
    pub errors: Vec<IngestFailure>,
}

/// Re-attempt ingestion of every `approved` extraction. Items that still
/// fail (for example a user-submitted pattern owning the identity key) stay
/// `approved` and are reported per item.
pub async fn retry_approved(pool: &PgPool) -> PipelineResult<RetryIngestReport> {
    let approved = Extraction::find_by_status(ExtractionStatus::Approved, pool).await?;
    let mut report = RetryIngestReport {
        attempted: approved.len(),
        ..Default::default()
    };

    for extraction in approved {
        match ingest_extraction(extraction.id, pool).await {
            Ok(ingestion) => report.ingested.push(IngestedItem {
                extraction_id: extraction.id,
                pattern_id: ingestion.pattern.id,
                merged: ingestion.action == IngestAction::Merged,
            }),
            Err(e) => report.errors.push(IngestFailure {
                extraction_id: extraction.id,
                kind: e.kind().to_string(),
                error: e.to_string(),
            }),
        }
    }

    info!(
        attempted = report.attempted,
        ingested = report.ingested.len(),
        failed = report.errors.len(),
        "Retried approved extractions"
    );
    Ok(report)
}
