//! Atomic merge of an approved extraction into the canonical catalog.

use std::fmt::Display;

use sqlx::{PgConnection, PgPool};
use tracing::{info, warn};

use crate::common::{ExtractionId, PipelineError, PipelineResult};
use crate::domains::catalog::actions::{attach_children, lock_identity};
use crate::domains::catalog::{CanonicalPattern, ChildCounts, PatternFields};
use crate::domains::extraction::{Extraction, ExtractionStatus};

/// What ingestion did with the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestAction {
    /// No pattern had the identity key; a tagged one was created.
    Created,
    /// A pipeline-created pattern already had the key; new children were added.
    Merged,
}

#[derive(Debug, Clone)]
pub struct Ingestion {
    pub action: IngestAction,
    pub pattern: CanonicalPattern,
    pub extraction: Extraction,
    pub children: ChildCounts,
}

fn tx_error(e: impl Display) -> PipelineError {
    PipelineError::IngestionTransaction(e.to_string())
}

/// Ingest one approved extraction, as a single transaction.
///
/// Concurrent ingestions of the same identity key serialize on an advisory
/// lock. Any failure rolls back every write, leaving the extraction
/// `approved` so the call can be retried.
pub async fn ingest_extraction(id: ExtractionId, pool: &PgPool) -> PipelineResult<Ingestion> {
    let mut tx = pool.begin().await.map_err(tx_error)?;

    match ingest_in_tx(id, &mut tx).await {
        Ok(ingestion) => {
            tx.commit().await.map_err(tx_error)?;
            info!(
                extraction_id = %id,
                pattern_id = %ingestion.pattern.id,
                identity_key = %ingestion.pattern.identity_key,
                action = ?ingestion.action,
                materials_linked = ingestion.children.materials_linked,
                "Extraction ingested"
            );
            Ok(ingestion)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                warn!(extraction_id = %id, error = %rollback, "Rollback failed");
            }
            warn!(extraction_id = %id, error = %e, "Ingestion rolled back");
            Err(e)
        }
    }
}

async fn ingest_in_tx(id: ExtractionId, conn: &mut PgConnection) -> PipelineResult<Ingestion> {
    let extraction = Extraction::find_for_update(id, &mut *conn)
        .await
        .map_err(tx_error)?
        .ok_or_else(|| PipelineError::not_found("extraction", id))?;

    if extraction.status()? != ExtractionStatus::Approved {
        return Err(PipelineError::Conflict(format!(
            "extraction {} is '{}', only approved extractions can be ingested",
            id, extraction.status
        )));
    }

    let payload = extraction.payload().normalized();
    payload.validate_for_approval()?;
    let fields = PatternFields::from_payload(&payload).ok_or_else(|| {
        PipelineError::Validation(format!(
            "extraction {} has no pattern name or identity key",
            id
        ))
    })?;

    lock_identity(&fields.identity_key, &mut *conn)
        .await
        .map_err(tx_error)?;

    let existing = CanonicalPattern::find_by_identity_key_for_update(&fields.identity_key, &mut *conn)
        .await
        .map_err(tx_error)?;

    let (action, pattern, children) = match existing {
        None => {
            let pattern = CanonicalPattern::insert(&fields, Some(id), &mut *conn)
                .await
                .map_err(tx_error)?;
            let children = attach_children(pattern.id, &payload, Some(id), &mut *conn)
                .await
                .map_err(tx_error)?;
            (IngestAction::Created, pattern, children)
        }
        Some(pattern) if pattern.is_pipeline_created() => {
            let children = attach_children(pattern.id, &payload, Some(id), &mut *conn)
                .await
                .map_err(tx_error)?;
            CanonicalPattern::touch(pattern.id, &mut *conn)
                .await
                .map_err(tx_error)?;
            (IngestAction::Merged, pattern, children)
        }
        Some(_) => {
            return Err(PipelineError::DuplicateIdentity {
                identity_key: fields.identity_key,
            });
        }
    };

    let extraction = Extraction::mark_ingested(id, pattern.id, &mut *conn)
        .await
        .map_err(tx_error)?
        .ok_or_else(|| {
            PipelineError::Conflict(format!("extraction {} changed during ingestion", id))
        })?;

    Ok(Ingestion {
        action,
        pattern,
        extraction,
        children,
    })
}
