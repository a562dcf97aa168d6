pub mod extraction;
pub mod payload;

pub use extraction::*;
pub use payload::*;
