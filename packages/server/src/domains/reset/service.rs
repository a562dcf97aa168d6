use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tracing::{info, warn};
use typed_builder::TypedBuilder;

use crate::common::{ExtractionId, PipelineResult};
use crate::domains::catalog::{
    CanonicalPattern, Material, PatternMaterial, PatternResource, PatternSubstitution,
    PatternVariation,
};
use crate::domains::extraction::{Extraction, ExtractionStatus, IngestedQuery};
use crate::domains::source::SourceType;

/// Which ingested extractions to reset. Empty means all of them.
#[derive(Debug, Clone, Default, TypedBuilder)]
#[builder(field_defaults(default, setter(strip_option)))]
pub struct ResetFilter {
    pub source_type: Option<SourceType>,
    /// Inclusive lower bound on `ingested_at`.
    pub ingested_since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `ingested_at`.
    pub ingested_until: Option<DateTime<Utc>>,
    pub extraction_ids: Option<Vec<ExtractionId>>,
}

impl ResetFilter {
    fn to_query(&self) -> IngestedQuery {
        IngestedQuery {
            source_type: self.source_type.map(|t| t.as_str().to_string()),
            ingested_since: self.ingested_since,
            ingested_until: self.ingested_until,
            extraction_ids: self.extraction_ids.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetItemError {
    pub extraction_id: ExtractionId,
    pub kind: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetReport {
    pub reset_count: u64,
    pub deleted_pattern_count: u64,
    pub errors: Vec<ResetItemError>,
}

#[derive(Debug, Default)]
struct ItemOutcome {
    reset: u64,
    deleted_patterns: u64,
}

/// Undo ingestion for every matching `ingested` extraction.
///
/// Each extraction is reset in its own transaction. Resetting the extraction
/// that created a pattern also resets every extraction merged into it. A
/// second run with nothing newly ingested resets nothing.
pub async fn reset_ingested(filter: &ResetFilter, pool: &PgPool) -> PipelineResult<ResetReport> {
    let candidates = Extraction::find_ingested_ids(&filter.to_query(), pool).await?;
    let mut report = ResetReport::default();

    for id in candidates {
        match reset_one(id, pool).await {
            Ok(outcome) => {
                report.reset_count += outcome.reset;
                report.deleted_pattern_count += outcome.deleted_patterns;
            }
            Err(e) => {
                warn!(extraction_id = %id, error = %e, "Reset failed, rolled back");
                report.errors.push(ResetItemError {
                    extraction_id: id,
                    kind: e.kind().to_string(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        reset_count = report.reset_count,
        deleted_pattern_count = report.deleted_pattern_count,
        errors = report.errors.len(),
        "Reset finished"
    );
    Ok(report)
}

async fn reset_one(id: ExtractionId, pool: &PgPool) -> PipelineResult<ItemOutcome> {
    // Lock order is pattern then extractions; an earlier creator reset in
    // this batch may already have reverted this one.
    let pattern_id = match Extraction::find_by_id_optional(id, pool).await? {
        Some(e) if e.status()? == ExtractionStatus::Ingested => e.ingested_pattern_id,
        _ => None,
    };
    let Some(pattern_id) = pattern_id else {
        return Ok(ItemOutcome::default());
    };

    let mut tx = pool.begin().await?;

    let pattern = CanonicalPattern::find_for_update(pattern_id, &mut tx).await?;
    let extraction = Extraction::find_for_update(id, &mut tx).await?;
    let still_ingested = extraction
        .as_ref()
        .map(|e| e.status == ExtractionStatus::Ingested.as_str() && e.ingested_pattern_id == Some(pattern_id))
        .unwrap_or(false);
    if !still_ingested {
        return Ok(ItemOutcome::default());
    }

    let is_creator = pattern
        .as_ref()
        .and_then(|p| p.source_extraction_id)
        .map(|tag| tag == id)
        .unwrap_or(false);
    let affected = if is_creator {
        Extraction::lock_ingested_for_pattern(pattern_id, &mut tx).await?
    } else {
        vec![id]
    };

    let reset = Extraction::revert_ingested(&affected, &mut tx).await?;

    let links = PatternMaterial::delete_tagged(&affected, &mut tx).await?;
    let variations = PatternVariation::delete_tagged(&affected, &mut tx).await?;
    let resources = PatternResource::delete_tagged(&affected, &mut tx).await?;
    let substitutions = PatternSubstitution::delete_tagged(&affected, &mut tx).await?;
    let materials = Material::delete_tagged_orphans(&affected, &mut tx).await?;
    let deleted_patterns = CanonicalPattern::delete_tagged(&affected, &mut tx).await?;

    tx.commit().await?;

    info!(
        extraction_id = %id,
        pattern_id = %pattern_id,
        reset = reset,
        links = links,
        variations = variations,
        resources = resources,
        substitutions = substitutions,
        materials = materials,
        deleted_patterns = deleted_patterns,
        "Ingestion reset"
    );

    Ok(ItemOutcome {
        reset,
        deleted_patterns,
    })
}
