// Trait definitions for dependency injection
//
// These are INFRASTRUCTURE traits only - no business logic.
// Pipeline rules (retries, status transitions) live in domain functions that use these traits.
//
// Naming convention: Base* for trait names (e.g., BaseContentFetcher)

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::common::PipelineResult;
use crate::domains::extraction::ExtractedPayload;
use crate::domains::source::SourceMetadata;

// =============================================================================
// Content Fetcher Trait (Infrastructure - scraping)
// =============================================================================

/// Content fetched for a source, already reduced to Markdown text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedContent {
    pub url: String,
    pub title: Option<String>,
    pub markdown: String,
}

#[async_trait]
pub trait BaseContentFetcher: Send + Sync {
    /// Fetch a URL and return its main content.
    ///
    /// Errors must be classified: `TransientNetwork` for anything worth
    /// retrying, `PermanentSource` for everything else.
    async fn fetch(&self, url: &str) -> PipelineResult<FetchedContent>;
}

// =============================================================================
// Extraction Oracle Trait (Infrastructure - external field extraction)
// =============================================================================

#[async_trait]
pub trait BaseExtractionOracle: Send + Sync {
    /// Turn raw content into one structured candidate record.
    async fn extract(
        &self,
        raw_content: &str,
        metadata: &SourceMetadata,
    ) -> PipelineResult<ExtractedPayload>;
}
