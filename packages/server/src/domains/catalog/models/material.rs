use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::common::{ExtractionId, MaterialId, PatternId};
use crate::domains::extraction::MaterialEntry;

/// Material - shared catalog entity, unique on type + name + color + size.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: MaterialId,
    pub material_key: String,
    pub material_type: String,
    pub name: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub source_extraction_id: Option<ExtractionId>,
    pub created_at: DateTime<Utc>,
}

/// A pattern's ordered use of a material.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PatternMaterial {
    pub id: Uuid,
    pub pattern_id: PatternId,
    pub material_id: MaterialId,
    pub position: i32,
    pub required: bool,
    pub source_extraction_id: Option<ExtractionId>,
    pub created_at: DateTime<Utc>,
}

/// Joined view used for listings and the completeness snapshot.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct LinkedMaterial {
    pub material_id: MaterialId,
    pub material_type: String,
    pub name: String,
    pub color: Option<String>,
    pub size: Option<String>,
    pub position: i32,
    pub required: bool,
}

impl Material {
    pub async fn find_by_key(material_key: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM materials WHERE material_key = $1")
            .bind(material_key)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Find or create the shared material for an entry. The provenance tag
    /// is only written when this call creates the row; an existing material
    /// keeps whatever tag it already had.
    pub async fn upsert(
        entry: &MaterialEntry,
        provenance: Option<ExtractionId>,
        conn: &mut PgConnection,
    ) -> Result<Self> {
        let material_key = entry.material_key();

        let inserted = sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO materials (id, material_key, material_type, name, color, size, source_extraction_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (material_key) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(MaterialId::new())
        .bind(&material_key)
        .bind(entry.material_type.as_str())
        .bind(&entry.name)
        .bind(&entry.color)
        .bind(&entry.size)
        .bind(provenance)
        .fetch_optional(&mut *conn)
        .await?;

        if let Some(material) = inserted {
            return Ok(material);
        }

        sqlx::query_as::<_, Self>("SELECT * FROM materials WHERE material_key = $1")
            .bind(&material_key)
            .fetch_one(&mut *conn)
            .await
            .map_err(Into::into)
    }

    /// Delete tagged materials that no pattern links to any more.
    ///
    /// Besides `tags`, this also collects materials whose tagging extraction
    /// is no longer ingested. Such a material outlived its creator's reset
    /// because another pattern still linked it, and becomes collectable once
    /// that last link is gone.
    pub async fn delete_tagged_orphans(tags: &[ExtractionId], conn: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM materials m
            WHERE m.source_extraction_id IS NOT NULL
              AND (
                m.source_extraction_id = ANY($1)
                OR NOT EXISTS (
                    SELECT 1 FROM extractions e
                    WHERE e.id = m.source_extraction_id AND e.status = 'ingested'
                )
              )
              AND NOT EXISTS (SELECT 1 FROM pattern_materials pm WHERE pm.material_id = m.id)
            "#,
        )
        .bind(tags)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}

impl PatternMaterial {
    pub async fn next_position(pattern_id: PatternId, conn: &mut PgConnection) -> Result<i32> {
        sqlx::query_scalar::<_, i32>(
            "SELECT COALESCE(MAX(position) + 1, 0) FROM pattern_materials WHERE pattern_id = $1",
        )
        .bind(pattern_id)
        .fetch_one(conn)
        .await
        .map_err(Into::into)
    }

    /// Link a material to a pattern. Returns `None` if the pattern already
    /// uses it (existing links are never modified).
    pub async fn link(
        pattern_id: PatternId,
        material_id: MaterialId,
        position: i32,
        required: bool,
        provenance: Option<ExtractionId>,
        conn: &mut PgConnection,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO pattern_materials (id, pattern_id, material_id, position, required, source_extraction_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (pattern_id, material_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(pattern_id)
        .bind(material_id)
        .bind(position)
        .bind(required)
        .bind(provenance)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }

    pub async fn count_for_pattern(pattern_id: PatternId, pool: &PgPool) -> Result<i64> {
        sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM pattern_materials WHERE pattern_id = $1")
            .bind(pattern_id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn delete_tagged(tags: &[ExtractionId], conn: &mut PgConnection) -> Result<u64> {
        let result = sqlx::query(
            "DELETE FROM pattern_materials WHERE source_extraction_id IS NOT NULL AND source_extraction_id = ANY($1)",
        )
        .bind(tags)
        .execute(conn)
        .await?;
        Ok(result.rows_affected())
    }
}

impl LinkedMaterial {
    /// Materials of one pattern in link order.
    pub async fn for_pattern(pattern_id: PatternId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            SELECT m.id AS material_id, m.material_type, m.name, m.color, m.size,
                   pm.position, pm.required
            FROM pattern_materials pm
            JOIN materials m ON m.id = pm.material_id
            WHERE pm.pattern_id = $1
            ORDER BY pm.position, m.name
            "#,
        )
        .bind(pattern_id)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Every link in the catalog, paired with its pattern id.
    pub async fn all_with_pattern(pool: &PgPool) -> Result<Vec<(PatternId, Self)>> {
        #[derive(sqlx::FromRow)]
        struct Row {
            pattern_id: PatternId,
            #[sqlx(flatten)]
            material: LinkedMaterial,
        }

        let rows = sqlx::query_as::<_, Row>(
            r#"
            SELECT pm.pattern_id, m.id AS material_id, m.material_type, m.name, m.color,
                   m.size, pm.position, pm.required
            FROM pattern_materials pm
            JOIN materials m ON m.id = pm.material_id
            ORDER BY pm.pattern_id, pm.position
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|r| (r.pattern_id, r.material)).collect())
    }
}
