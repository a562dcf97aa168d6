// Common types and utilities shared across the pipeline

pub mod entity_ids;
pub mod errors;
pub mod id;
pub mod pagination;
pub mod string_enum;
pub mod utils;

pub use entity_ids::*;
pub use errors::{PipelineError, PipelineResult};
pub use id::Id;
pub use pagination::{Page, PageArgs};
