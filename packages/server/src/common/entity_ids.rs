//! Typed ID definitions for pipeline and catalog entities.

pub use super::id::Id;

// ============================================================================
// Entity marker types
// ============================================================================

/// Marker type for discovered external content.
pub struct Source;

/// Marker type for one extraction attempt over a source.
pub struct Extraction;

/// Marker type for canonical catalog patterns.
pub struct Pattern;

/// Marker type for shared material catalog entries.
pub struct Material;

// ============================================================================
// Type aliases - the primary API
// ============================================================================

pub type SourceId = Id<Source>;

pub type ExtractionId = Id<Extraction>;

pub type PatternId = Id<Pattern>;

pub type MaterialId = Id<Material>;
