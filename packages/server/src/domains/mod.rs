// Business domains
pub mod audit;
pub mod catalog;
pub mod extraction;
pub mod ingestion;
pub mod reset;
pub mod review;
pub mod scraping;
pub mod source;
pub mod stats;
