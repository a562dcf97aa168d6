use sqlx::PgPool;
use tracing::{debug, info, warn};

use crate::common::utils::{canonicalize_url, content_hash};
use crate::common::{PipelineError, PipelineResult, SourceId};

use super::models::{Source, SourceMetadata, SourceStatus, SourceType};

/// Input for registering discovered content.
#[derive(Debug, Clone)]
pub struct NewSource {
    pub url: String,
    pub source_type: SourceType,
    pub discovery_query: Option<String>,
    pub metadata: SourceMetadata,
}

/// Register a discovered URL. Idempotent: a known URL returns the existing
/// row unchanged.
pub async fn register_source(input: NewSource, pool: &PgPool) -> PipelineResult<Source> {
    let url = canonicalize_url(&input.url)?;

    if let Some(source) = Source::insert_if_absent(
        &url,
        input.source_type,
        input.discovery_query.as_deref(),
        &input.metadata,
        pool,
    )
    .await?
    {
        info!(source_id = %source.id, url = %source.url, "Registered source");
        return Ok(source);
    }

    let existing = Source::find_by_url(&url, pool)
        .await?
        .ok_or_else(|| PipelineError::not_found("source", &url))?;
    debug!(source_id = %existing.id, url = %url, "Source already registered");
    Ok(existing)
}

/// Record scraped content. Valid only from `discovered`.
pub async fn mark_scraped(id: SourceId, raw_content: &str, pool: &PgPool) -> PipelineResult<Source> {
    if raw_content.trim().is_empty() {
        return Err(PipelineError::PermanentSource(format!(
            "source {} returned empty content",
            id
        )));
    }

    let hash = content_hash(raw_content);
    match Source::mark_scraped(id, raw_content, &hash, pool).await? {
        Some(source) => {
            let duplicates = Source::find_by_content_hash(&hash, id, pool).await?;
            if !duplicates.is_empty() {
                warn!(
                    source_id = %id,
                    duplicate_of = %duplicates[0].id,
                    "Scraped content matches an existing source"
                );
            }
            info!(source_id = %id, content_length = raw_content.len(), "Source scraped");
            Ok(source)
        }
        None => Err(transition_error(id, "scraped", &[SourceStatus::Discovered], pool).await),
    }
}

/// Mark a source failed. Valid from `discovered` or `scraped`.
pub async fn mark_failed(id: SourceId, reason: &str, pool: &PgPool) -> PipelineResult<Source> {
    match Source::mark_failed(id, reason, pool).await? {
        Some(source) => {
            warn!(source_id = %id, reason = %reason, "Source failed");
            Ok(source)
        }
        None => {
            Err(transition_error(id, "failed", &[SourceStatus::Discovered, SourceStatus::Scraped], pool)
                .await)
        }
    }
}

/// Explain why a conditional transition matched no row.
pub(crate) async fn transition_error(
    id: SourceId,
    target: &str,
    allowed: &[SourceStatus],
    pool: &PgPool,
) -> PipelineError {
    match Source::find_by_id_optional(id, pool).await {
        Ok(Some(source)) => PipelineError::Conflict(format!(
            "source {} is '{}', cannot move to '{}' (allowed from: {})",
            id,
            source.status,
            target,
            allowed
                .iter()
                .map(|s| s.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        )),
        Ok(None) => PipelineError::not_found("source", id),
        Err(e) => PipelineError::Internal(e),
    }
}
