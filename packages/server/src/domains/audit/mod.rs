//! Completeness auditor - read-only data-quality report over a catalog snapshot
//!
//! Used by operators to decide which patterns to re-extract. Reports are
//! files, never authoritative state.

pub mod report;
pub mod snapshot;

pub use report::{
    audit_catalog, AuditReport, CategoryBreakdown, Dimension, DimensionStat, IncompletePattern,
    INCOMPLETE_THRESHOLD,
};
pub use snapshot::{
    load_expected_names, parse_expected_names, CatalogSnapshot, PatternSnapshot, SnapshotMaterial,
    SnapshotResource,
};
