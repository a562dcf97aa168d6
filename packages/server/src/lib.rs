// Flybox - Pattern Pipeline Core
//
// Scrapes fly-tying patterns from external sources, scores the extracted
// candidates, routes them through human review and merges approved ones into
// the canonical catalog. Pipeline-created catalog rows carry a provenance tag
// so an ingestion can be undone without touching user-submitted data.

pub mod common;
pub mod config;
pub mod domains;
pub mod kernel;
pub mod server;

pub use config::*;
