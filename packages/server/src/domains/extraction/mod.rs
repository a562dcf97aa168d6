//! Extraction store - scored candidate records awaiting review
//!
//! An extraction is created once per oracle run over a scraped source. Its
//! confidence is recomputed from the payload whenever the payload changes.

pub mod actions;
pub mod confidence;
pub mod models;

pub use actions::{normalize_extraction, submit_extraction, update_extraction_payload};
pub use confidence::{score, ConfidenceBucket, ScoringConfig};
pub use models::{
    ConfidenceOrder, ExtractedPayload, Extraction, ExtractionQuery, ExtractionStatus,
    IngestedQuery, MaterialEntry, MaterialType, ResourceEntry, ResourceType,
};
