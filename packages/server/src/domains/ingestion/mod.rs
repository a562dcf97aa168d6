//! Ingestion engine - approved extractions into the canonical catalog
//!
//! Identity resolution per normalized key:
//! - no pattern: create one, every row tagged with the extraction id
//! - pipeline-created pattern: merge additively, new rows tagged
//! - user-submitted pattern: `DuplicateIdentity`, nothing written

pub mod actions;
pub mod engine;

pub use actions::{retry_approved, IngestFailure, IngestedItem, RetryIngestReport};
pub use engine::{ingest_extraction, IngestAction, Ingestion};
