//! Source registry - discovered content moving through discovery -> scrape -> extraction

pub mod actions;
pub mod models;

pub use actions::{mark_failed, mark_scraped, register_source, NewSource};
pub use models::{Source, SourceMetadata, SourceStatus, SourceType};
