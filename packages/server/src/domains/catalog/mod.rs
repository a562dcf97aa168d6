//! Canonical catalog - patterns and their owned child rows
//!
//! Rows written by ingestion carry `source_extraction_id`; rows written by
//! direct user submission never do.

pub mod actions;
pub mod models;
pub mod snapshot;

pub use actions::{materials_for, submit_user_pattern, ChildCounts};
pub use models::{
    CanonicalPattern, LinkedMaterial, Material, PatternFields, PatternMaterial, PatternResource,
    PatternSubstitution, PatternVariation,
};
pub use snapshot::load_snapshot;
