//! Scraping - bounded worker pool feeding the extraction store

pub mod runner;

pub use runner::{ScrapeFailure, ScrapeRunReport, ScrapeRunner};
