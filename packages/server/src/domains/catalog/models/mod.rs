pub mod children;
pub mod material;
pub mod pattern;

pub use children::*;
pub use material::*;
pub use pattern::*;
