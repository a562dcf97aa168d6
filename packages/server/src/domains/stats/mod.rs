//! Pipeline stats - read-only operator rollups

use serde::Serialize;
use sqlx::PgPool;

use crate::common::PipelineResult;
use crate::domains::extraction::confidence::{HIGH_CONFIDENCE, MEDIUM_CONFIDENCE};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStats {
    pub sources_discovered: i64,
    pub sources_scraped: i64,
    pub sources_extracted: i64,
    pub sources_failed: i64,
    pub extractions_total: i64,
    pub extractions_high_confidence: i64,
    pub extractions_low_confidence: i64,
    pub patterns_normalized: i64,
    pub patterns_approved: i64,
    pub patterns_ingested: i64,
    pub patterns_rejected: i64,
}

impl PipelineStats {
    pub async fn load(pool: &PgPool) -> PipelineResult<Self> {
        let stats = sqlx::query_as::<_, Self>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM sources WHERE status = 'discovered') AS sources_discovered,
                (SELECT COUNT(*) FROM sources WHERE status = 'scraped') AS sources_scraped,
                (SELECT COUNT(*) FROM sources WHERE status = 'extracted') AS sources_extracted,
                (SELECT COUNT(*) FROM sources WHERE status = 'failed') AS sources_failed,
                COUNT(e.id) AS extractions_total,
                COUNT(e.id) FILTER (WHERE e.confidence >= $1) AS extractions_high_confidence,
                COUNT(e.id) FILTER (WHERE e.confidence < $2) AS extractions_low_confidence,
                COUNT(e.id) FILTER (WHERE e.status = 'normalized') AS patterns_normalized,
                COUNT(e.id) FILTER (WHERE e.status = 'approved') AS patterns_approved,
                COUNT(e.id) FILTER (WHERE e.status = 'ingested') AS patterns_ingested,
                COUNT(e.id) FILTER (WHERE e.status = 'rejected') AS patterns_rejected
            FROM extractions e
            "#,
        )
        .bind(HIGH_CONFIDENCE)
        .bind(MEDIUM_CONFIDENCE)
        .fetch_one(pool)
        .await?;
        Ok(stats)
    }
}
