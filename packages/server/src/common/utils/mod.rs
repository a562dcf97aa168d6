// Pure helpers: no database or network access.

pub mod content_hash;
pub mod identity;
pub mod urls;

pub use self::content_hash::*;
pub use self::identity::*;
pub use self::urls::*;
