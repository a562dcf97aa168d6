//! Catalog write paths shared by ingestion and direct user submission.

use anyhow::Result;
use sqlx::{PgConnection, PgPool};
use tracing::info;

use crate::common::{ExtractionId, PatternId, PipelineError, PipelineResult};
use crate::domains::extraction::ExtractedPayload;

use super::models::{
    CanonicalPattern, LinkedMaterial, Material, PatternFields, PatternMaterial, PatternResource,
    PatternSubstitution, PatternVariation,
};

/// Rows written for one pattern by a single create or merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChildCounts {
    pub materials_linked: usize,
    pub variations: usize,
    pub substitutions: usize,
    pub resources: usize,
}

impl ChildCounts {
    pub fn total(&self) -> usize {
        self.materials_linked + self.variations + self.substitutions + self.resources
    }
}

impl PatternFields {
    /// Scalar columns for a normalized payload. `None` without a name or key.
    pub fn from_payload(payload: &ExtractedPayload) -> Option<Self> {
        Some(Self {
            identity_key: payload.resolved_identity_key()?,
            name: payload.pattern_name()?.to_string(),
            category: payload.category.map(|c| c.as_str().to_string()),
            difficulty: payload.difficulty.map(|d| d.as_str().to_string()),
            water_type: payload.water_type.map(|w| w.as_str().to_string()),
            origin: payload.origin.clone(),
            description: payload.description.clone(),
            image_url: payload.image_url.clone(),
            instructions: payload.instructions.clone(),
        })
    }
}

/// Serialize writers of one identity key until the transaction ends.
pub(crate) async fn lock_identity(identity_key: &str, conn: &mut PgConnection) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
        .bind(identity_key)
        .execute(conn)
        .await?;
    Ok(())
}

/// Add the payload's children to a pattern. Existing rows are left alone;
/// new rows carry `provenance`.
pub(crate) async fn attach_children(
    pattern_id: PatternId,
    payload: &ExtractedPayload,
    provenance: Option<ExtractionId>,
    conn: &mut PgConnection,
) -> Result<ChildCounts> {
    let mut counts = ChildCounts::default();

    let mut position = PatternMaterial::next_position(pattern_id, &mut *conn).await?;
    for entry in &payload.materials {
        let material = Material::upsert(entry, provenance, &mut *conn).await?;
        let linked = PatternMaterial::link(
            pattern_id,
            material.id,
            position,
            entry.required,
            provenance,
            &mut *conn,
        )
        .await?;
        if linked.is_some() {
            counts.materials_linked += 1;
            position += 1;
        }
    }

    for variation in &payload.variations {
        if PatternVariation::insert_if_absent(pattern_id, variation, provenance, &mut *conn).await? {
            counts.variations += 1;
        }
    }

    for substitution in &payload.substitutions {
        if PatternSubstitution::insert_if_absent(pattern_id, substitution, provenance, &mut *conn)
            .await?
        {
            counts.substitutions += 1;
        }
    }

    for resource in &payload.resources {
        if PatternResource::insert_if_absent(pattern_id, resource, provenance, &mut *conn).await? {
            counts.resources += 1;
        }
    }

    Ok(counts)
}

/// Trusted direct-submission path. Creates an untagged pattern with its
/// children; no review, no provenance tag.
pub async fn submit_user_pattern(
    pattern: ExtractedPayload,
    pool: &PgPool,
) -> PipelineResult<CanonicalPattern> {
    let pattern = pattern.normalized();
    pattern.validate_ingress()?;
    pattern.validate_for_approval()?;
    let fields = PatternFields::from_payload(&pattern)
        .ok_or_else(|| PipelineError::Validation("pattern name is missing".into()))?;

    let mut tx = pool.begin().await?;
    lock_identity(&fields.identity_key, &mut tx).await?;

    if let Some(existing) =
        CanonicalPattern::find_by_identity_key_for_update(&fields.identity_key, &mut tx).await?
    {
        return Err(PipelineError::Conflict(format!(
            "pattern '{}' already exists ({})",
            fields.identity_key, existing.id
        )));
    }

    let created = CanonicalPattern::insert(&fields, None, &mut tx).await?;
    let counts = attach_children(created.id, &pattern, None, &mut tx).await?;
    tx.commit().await?;

    info!(
        pattern_id = %created.id,
        identity_key = %created.identity_key,
        materials = counts.materials_linked,
        "User pattern submitted"
    );
    Ok(created)
}

/// Materials linked to a pattern, in order.
pub async fn materials_for(pattern_id: PatternId, pool: &PgPool) -> Result<Vec<LinkedMaterial>> {
    LinkedMaterial::for_pattern(pattern_id, pool).await
}
