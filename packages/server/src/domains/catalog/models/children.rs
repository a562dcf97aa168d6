use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::common::{ExtractionId, PatternId};
use crate::domains::extraction::models::{ResourceEntry, SubstitutionEntry, VariationEntry};

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PatternVariation {
    pub id: Uuid,
    pub pattern_id: PatternId,
    pub name: String,
    pub description: Option<String>,
    pub source_extraction_id: Option<ExtractionId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PatternSubstitution {
    pub id: Uuid,
    pub pattern_id: PatternId,
    pub original_material: String,
    pub substitute_material: String,
    pub notes: Option<String>,
    pub source_extraction_id: Option<ExtractionId>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PatternResource {
    pub id: Uuid,
    pub pattern_id: PatternId,
    pub resource_type: String,
    pub url: String,
    pub title: Option<String>,
    pub source_extraction_id: Option<ExtractionId>,
    pub created_at: DateTime<Utc>,
}

impl PatternVariation {
    /// Insert unless the pattern already has a variation with this name.
    pub async fn insert_if_absent(
        pattern_id: PatternId,
        entry: &VariationEntry,
        provenance: Option<ExtractionId>,
        conn: &mut PgConnection,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO pattern_variations (id, pattern_id, name, description, source_extraction_id)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (pattern_id, name) DO NOTHING
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(pattern_id)
        .bind(&entry.name)
        .bind(&entry.description)
        .bind(provenance)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_pattern(pattern_id: PatternId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM pattern_variations WHERE pattern_id = $1 ORDER BY created_at, id",
        )
        .bind(pattern_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn delete_tagged(tags: &[ExtractionId], conn: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM pattern_variations WHERE source_extraction_id IS NOT NULL AND source_extraction_id = ANY($1)",
        )
        .bind(tags)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}

impl PatternSubstitution {
    pub async fn insert_if_absent(
        pattern_id: PatternId,
        entry: &SubstitutionEntry,
        provenance: Option<ExtractionId>,
        conn: &mut PgConnection,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO pattern_substitutions
                (id, pattern_id, original_material, substitute_material, notes, source_extraction_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (pattern_id, original_material, substitute_material) DO NOTHING
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(pattern_id)
        .bind(&entry.original)
        .bind(&entry.substitute)
        .bind(&entry.notes)
        .bind(provenance)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_pattern(pattern_id: PatternId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM pattern_substitutions WHERE pattern_id = $1 ORDER BY created_at, id",
        )
        .bind(pattern_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn delete_tagged(tags: &[ExtractionId], conn: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM pattern_substitutions WHERE source_extraction_id IS NOT NULL AND source_extraction_id = ANY($1)",
        )
        .bind(tags)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}

impl PatternResource {
    pub async fn insert_if_absent(
        pattern_id: PatternId,
        entry: &ResourceEntry,
        provenance: Option<ExtractionId>,
        conn: &mut PgConnection,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO pattern_resources (id, pattern_id, resource_type, url, title, source_extraction_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (pattern_id, url) DO NOTHING
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(pattern_id)
        .bind(entry.resource_type.as_str())
        .bind(&entry.url)
        .bind(&entry.title)
        .bind(provenance)
        .execute(conn)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn find_by_pattern(pattern_id: PatternId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM pattern_resources WHERE pattern_id = $1 ORDER BY created_at, id",
        )
        .bind(pattern_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    pub async fn find_all(pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM pattern_resources ORDER BY pattern_id, created_at")
            .fetch_all(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn delete_tagged(tags: &[ExtractionId], conn: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM pattern_resources WHERE source_extraction_id IS NOT NULL AND source_extraction_id = ANY($1)",
        )
        .bind(tags)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}
