use std::collections::HashMap;

use anyhow::Result;
use sqlx::PgPool;
use tracing::debug;

use crate::common::PatternId;
use crate::domains::audit::{CatalogSnapshot, PatternSnapshot, SnapshotMaterial, SnapshotResource};

use super::models::{CanonicalPattern, LinkedMaterial, PatternResource};

/// Build an auditor snapshot from the live catalog tables.
pub async fn load_snapshot(pool: &PgPool) -> Result<CatalogSnapshot> {
    let patterns = CanonicalPattern::find_all(pool).await?;

    let mut materials: HashMap<PatternId, Vec<SnapshotMaterial>> = HashMap::new();
    for (pattern_id, material) in LinkedMaterial::all_with_pattern(pool).await? {
        materials.entry(pattern_id).or_default().push(SnapshotMaterial {
            material_type: material.material_type,
            name: material.name,
        });
    }

    let mut resources: HashMap<PatternId, Vec<SnapshotResource>> = HashMap::new();
    for resource in PatternResource::find_all(pool).await? {
        resources
            .entry(resource.pattern_id)
            .or_default()
            .push(SnapshotResource {
                resource_type: resource.resource_type,
                url: resource.url,
            });
    }

    let patterns: Vec<PatternSnapshot> = patterns
        .into_iter()
        .map(|p| PatternSnapshot {
            materials: materials.remove(&p.id).unwrap_or_default(),
            resources: resources.remove(&p.id).unwrap_or_default(),
            name: p.name,
            category: p.category,
            image_url: p.image_url,
            instructions: p.instructions.0,
            origin: p.origin,
        })
        .collect();

    debug!(patterns = patterns.len(), "Loaded catalog snapshot");
    Ok(CatalogSnapshot { patterns })
}
