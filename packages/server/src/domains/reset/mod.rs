//! Reset / reprocessing - compensating transactions that undo ingestion
//!
//! Only rows carrying a provenance tag are ever deleted. Child foreign keys
//! have no cascade, so an untagged row hanging off a tagged pattern makes
//! that item's transaction fail and roll back instead of being removed.
//!
//! A material keeps the tag of the extraction that first created it even when
//! other patterns link it too. Resetting the creator leaves the material in
//! place while anything still links it; the sweep at the end of each item
//! deletes it once the last link is gone and its tagging extraction is no
//! longer ingested.

pub mod service;

pub use service::{reset_ingested, ResetFilter, ResetItemError, ResetReport};
