use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::common::string_enum::string_enum;
use crate::common::{ExtractionId, PageArgs, PatternId, SourceId};
use crate::domains::extraction::confidence::ConfidenceBucket;

use super::payload::ExtractedPayload;

/// Extraction - one candidate record produced from a source's raw content.
///
/// Append-only audit trail: rows are mutated through their lifecycle but
/// never deleted.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Extraction {
    pub id: ExtractionId,
    pub source_id: SourceId,
    pub payload: Json<ExtractedPayload>,
    pub pattern_name: Option<String>,
    pub identity_key: Option<String>,
    pub confidence: f64,
    pub status: String, // 'extracted', 'normalized', 'approved', 'rejected', 'ingested'
    pub review_notes: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub ingested_pattern_id: Option<PatternId>,
    pub ingested_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

string_enum! {
    pub enum ExtractionStatus {
        Extracted => "extracted",
        Normalized => "normalized",
        Approved => "approved",
        Rejected => "rejected",
        Ingested => "ingested",
    }
}

impl ExtractionStatus {
    /// Statuses a reviewer may act on.
    pub const PENDING: &'static [ExtractionStatus] =
        &[ExtractionStatus::Extracted, ExtractionStatus::Normalized];
}

/// Sort direction for the review queue's confidence ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfidenceOrder {
    Ascending,
    Descending,
}

impl ConfidenceOrder {
    fn sql(&self) -> &'static str {
        match self {
            ConfidenceOrder::Ascending => "ASC",
            ConfidenceOrder::Descending => "DESC",
        }
    }
}

/// Filters for queue listings.
#[derive(Debug, Clone, Default)]
pub struct ExtractionQuery {
    pub statuses: Vec<ExtractionStatus>,
    pub source_type: Option<String>,
    pub confidence_min: Option<f64>,
    pub confidence_max: Option<f64>,
}

/// Which ingested extractions a reset applies to.
#[derive(Debug, Clone, Default)]
pub struct IngestedQuery {
    pub source_type: Option<String>,
    pub ingested_since: Option<DateTime<Utc>>,
    pub ingested_until: Option<DateTime<Utc>>,
    pub extraction_ids: Option<Vec<ExtractionId>>,
}

fn status_list(statuses: &[ExtractionStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

impl Extraction {
    pub fn status(&self) -> Result<ExtractionStatus> {
        self.status.parse()
    }

    pub fn bucket(&self) -> ConfidenceBucket {
        ConfidenceBucket::from_score(self.confidence)
    }

    pub fn payload(&self) -> &ExtractedPayload {
        &self.payload.0
    }

    pub async fn find_by_id(id: ExtractionId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM extractions WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_id_optional(id: ExtractionId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM extractions WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Row lock for the duration of the caller's transaction.
    pub async fn find_for_update(id: ExtractionId, conn: &mut PgConnection) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM extractions WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_source(source_id: SourceId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM extractions WHERE source_id = $1 ORDER BY created_at, id",
        )
        .bind(source_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_status(status: ExtractionStatus, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM extractions WHERE status = $1 ORDER BY created_at, id",
        )
        .bind(status.as_str())
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_by_ingested_pattern(pattern_id: PatternId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM extractions WHERE ingested_pattern_id = $1 ORDER BY ingested_at, id",
        )
        .bind(pattern_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn insert(
        source_id: SourceId,
        payload: &ExtractedPayload,
        confidence: f64,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO extractions (id, source_id, payload, pattern_name, identity_key, confidence, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'extracted')
            RETURNING *
            "#,
        )
        .bind(ExtractionId::new())
        .bind(source_id)
        .bind(Json(payload))
        .bind(payload.pattern_name())
        .bind(payload.resolved_identity_key())
        .bind(confidence)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Replace the payload (and its derived columns) of a row still in one of
    /// `from` and unchanged since `read_at`. Returns `None` otherwise.
    pub async fn replace_payload(
        id: ExtractionId,
        payload: &ExtractedPayload,
        confidence: f64,
        from: &[ExtractionStatus],
        new_status: ExtractionStatus,
        read_at: DateTime<Utc>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE extractions
            SET payload = $2, pattern_name = $3, identity_key = $4, confidence = $5,
                status = $6, updated_at = NOW()
            WHERE id = $1 AND status = ANY($7) AND updated_at = $8
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(payload))
        .bind(payload.pattern_name())
        .bind(payload.resolved_identity_key())
        .bind(confidence)
        .bind(new_status.as_str())
        .bind(status_list(from))
        .bind(read_at)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// Conditional review transition: only moves rows currently in `from`
    /// and, when `read_at` is given, unchanged since then. Concurrent callers
    /// race on the row; exactly one gets `Some`.
    pub async fn transition_reviewed(
        id: ExtractionId,
        from: &[ExtractionStatus],
        to: ExtractionStatus,
        reviewer: &str,
        notes: Option<&str>,
        read_at: Option<DateTime<Utc>>,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE extractions
            SET status = $2, reviewed_by = $3, review_notes = $4,
                reviewed_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = ANY($5)
              AND ($6::timestamptz IS NULL OR updated_at = $6)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(to.as_str())
        .bind(reviewer)
        .bind(notes)
        .bind(status_list(from))
        .bind(read_at)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// `approved -> ingested`, inside the ingestion transaction.
    pub async fn mark_ingested(
        id: ExtractionId,
        pattern_id: PatternId,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE extractions
            SET status = 'ingested', ingested_pattern_id = $2,
                ingested_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'approved'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(pattern_id)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    /// Ingested extractions pointing at a pattern, locked for a reset.
    pub async fn lock_ingested_for_pattern(
        pattern_id: PatternId,
        conn: &mut PgConnection,
    ) -> Result<Vec<ExtractionId>> {
        sqlx::query_scalar::<_, ExtractionId>(
            r#"
            SELECT id FROM extractions
            WHERE ingested_pattern_id = $1 AND status = 'ingested'
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(pattern_id)
        .fetch_all(conn)
        .await
        .map_err(Into::into)
    }

    /// `ingested -> extracted`, clearing the pattern pointer.
    pub async fn revert_ingested(ids: &[ExtractionId], conn: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE extractions
            SET status = 'extracted', ingested_pattern_id = NULL,
                ingested_at = NULL, updated_at = NOW()
            WHERE id = ANY($1) AND status = 'ingested'
            "#,
        )
        .bind(ids)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }

    /// Ids of ingested extractions matching a reset filter, oldest first.
    pub async fn find_ingested_ids(query: &IngestedQuery, pool: &PgPool) -> Result<Vec<ExtractionId>> {
        sqlx::query_scalar::<_, ExtractionId>(
            r#"
            SELECT e.id FROM extractions e
            JOIN sources s ON s.id = e.source_id
            WHERE e.status = 'ingested'
              AND ($1::text IS NULL OR s.source_type = $1)
              AND ($2::timestamptz IS NULL OR e.ingested_at >= $2)
              AND ($3::timestamptz IS NULL OR e.ingested_at < $3)
              AND ($4::uuid[] IS NULL OR e.id = ANY($4))
            ORDER BY e.ingested_at, e.id
            "#,
        )
        .bind(query.source_type.as_deref())
        .bind(query.ingested_since)
        .bind(query.ingested_until)
        .bind(query.extraction_ids.as_deref())
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Review queue page ordered by confidence (ties broken by age).
    pub async fn find_paginated(
        query: &ExtractionQuery,
        order: ConfidenceOrder,
        args: &PageArgs,
        pool: &PgPool,
    ) -> Result<Vec<Self>> {
        let sql = format!(
            r#"
            SELECT e.* FROM extractions e
            JOIN sources s ON s.id = e.source_id
            WHERE e.status = ANY($1)
              AND ($2::text IS NULL OR s.source_type = $2)
              AND ($3::float8 IS NULL OR e.confidence >= $3)
              AND ($4::float8 IS NULL OR e.confidence <= $4)
            ORDER BY e.confidence {}, e.created_at ASC, e.id ASC
            LIMIT $5 OFFSET $6
            "#,
            order.sql()
        );

        sqlx::query_as::<_, Self>(&sql)
            .bind(status_list(&query.statuses))
            .bind(query.source_type.as_deref())
            .bind(query.confidence_min)
            .bind(query.confidence_max)
            .bind(args.fetch_limit())
            .bind(args.offset)
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }
}
