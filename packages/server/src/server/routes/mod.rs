// HTTP routes
pub mod extractions;
pub mod health;
pub mod stats;

pub use extractions::*;
pub use health::*;
pub use stats::*;
