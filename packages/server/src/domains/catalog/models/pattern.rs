use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::{PgConnection, PgPool};

use crate::common::{ExtractionId, PatternId};

/// CanonicalPattern - an authoritative catalog entry.
///
/// `source_extraction_id` is the provenance tag: set when the ingestion
/// engine created the row, NULL when a user submitted it directly.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalPattern {
    pub id: PatternId,
    pub identity_key: String,
    pub name: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub water_type: Option<String>,
    pub origin: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub instructions: Json<Vec<String>>,
    pub source_extraction_id: Option<ExtractionId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Column values for a new pattern row.
#[derive(Debug, Clone)]
pub struct PatternFields {
    pub identity_key: String,
    pub name: String,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub water_type: Option<String>,
    pub origin: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub instructions: Vec<String>,
}

impl CanonicalPattern {
    pub fn is_pipeline_created(&self) -> bool {
        self.source_extraction_id.is_some()
    }

    pub async fn find_by_id(id: PatternId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM patterns WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_id_optional(id: PatternId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM patterns WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_identity_key(identity_key: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM patterns WHERE identity_key = $1")
            .bind(identity_key)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Identity lookup that locks the row for the caller's transaction.
    pub async fn find_by_identity_key_for_update(
        identity_key: &str,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM patterns WHERE identity_key = $1 FOR UPDATE")
            .bind(identity_key)
            .fetch_optional(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn find_for_update(id: PatternId, conn: &mut PgConnection) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM patterns WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(conn)
            .await
            .map_err(Into::into)
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM patterns ORDER BY name, id")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn count(pool: &PgPool) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM patterns")
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn count_by_identity_key(identity_key: &str, pool: &PgPool) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM patterns WHERE identity_key = $1")
            .bind(identity_key)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn insert(
        fields: &PatternFields,
        provenance: Option<ExtractionId>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO patterns (
                id, identity_key, name, category, difficulty, water_type,
                origin, description, image_url, instructions, source_extraction_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *
            "#,
        )
        .bind(PatternId::new())
        .bind(&fields.identity_key)
        .bind(&fields.name)
        .bind(&fields.category)
        .bind(&fields.difficulty)
        .bind(&fields.water_type)
        .bind(&fields.origin)
        .bind(&fields.description)
        .bind(&fields.image_url)
        .bind(Json(&fields.instructions))
        .bind(provenance)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn touch(id: PatternId, conn: &mut PgConnection) -> Result<()> {
        sqlx::query("UPDATE patterns SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;
        Ok(())
    }

    /// Delete patterns carrying any of the given provenance tags. Untagged
    /// rows can never match.
    pub async fn delete_tagged(tags: &[ExtractionId], conn: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM patterns WHERE source_extraction_id IS NOT NULL AND source_extraction_id = ANY($1)",
        )
        .bind(tags)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}
