// TestDependencies - mock implementations for testing
//
// Scripted fetcher and oracle that record every call, so tests can drive the
// scrape runner without network access.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;

use super::{
    BaseContentFetcher, BaseExtractionOracle, DomainRateLimiter, FetchedContent, PipelineDeps,
    RetryPolicy,
};
use crate::common::{PipelineError, PipelineResult};
use crate::domains::extraction::{ExtractedPayload, ScoringConfig};
use crate::domains::source::SourceMetadata;

/// Scripted outcome for one mocked call.
#[derive(Debug, Clone)]
pub enum MockOutcome<T> {
    Ok(T),
    Transient(String),
    Permanent(String),
}

impl<T> MockOutcome<T> {
    fn into_result(self) -> PipelineResult<T> {
        match self {
            MockOutcome::Ok(value) => Ok(value),
            MockOutcome::Transient(reason) => Err(PipelineError::TransientNetwork(reason)),
            MockOutcome::Permanent(reason) => Err(PipelineError::PermanentSource(reason)),
        }
    }
}

// =============================================================================
// Mock Content Fetcher
// =============================================================================

pub struct MockContentFetcher {
    scripts: Arc<Mutex<HashMap<String, Vec<MockOutcome<String>>>>>,
    calls: Arc<Mutex<Vec<String>>>,
}

impl MockContentFetcher {
    pub fn new() -> Self {
        Self {
            scripts: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn push(self, url: &str, outcome: MockOutcome<String>) -> Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push(outcome);
        self
    }

    /// Return this Markdown for `url`.
    pub fn with_page(self, url: &str, markdown: &str) -> Self {
        self.push(url, MockOutcome::Ok(markdown.to_string()))
    }

    /// Fail `url` transiently `times` times before any later scripted outcome.
    pub fn with_transient_failures(mut self, url: &str, times: usize) -> Self {
        for i in 0..times {
            self = self.push(url, MockOutcome::Transient(format!("timeout #{}", i + 1)));
        }
        self
    }

    pub fn with_permanent_failure(self, url: &str, reason: &str) -> Self {
        self.push(url, MockOutcome::Permanent(reason.to_string()))
    }

    /// Get all URLs that were fetched, in call order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
    }
}

impl Default for MockContentFetcher {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseContentFetcher for MockContentFetcher {
    async fn fetch(&self, url: &str) -> PipelineResult<FetchedContent> {
        self.calls.lock().unwrap().push(url.to_string());

        let outcome = {
            let mut scripts = self.scripts.lock().unwrap();
            match scripts.get_mut(url) {
                // The last scripted outcome repeats once the queue drains.
                Some(queue) if queue.len() > 1 => queue.remove(0),
                Some(queue) if queue.len() == 1 => queue[0].clone(),
                _ => MockOutcome::Ok(format!("# Mock Content\n\nMock page for {}.", url)),
            }
        };

        outcome.into_result().map(|markdown| FetchedContent {
            url: url.to_string(),
            title: Some("Mock Page".to_string()),
            markdown,
        })
    }
}

// =============================================================================
// Mock Extraction Oracle
// =============================================================================

/// Arguments captured from an extract call
#[derive(Debug, Clone)]
pub struct ExtractCallArgs {
    pub raw_content: String,
    pub metadata: SourceMetadata,
}

pub struct MockExtractionOracle {
    default_payload: ExtractedPayload,
    by_content: Arc<Mutex<HashMap<String, MockOutcome<ExtractedPayload>>>>,
    calls: Arc<Mutex<Vec<ExtractCallArgs>>>,
}

impl MockExtractionOracle {
    pub fn new() -> Self {
        Self {
            default_payload: ExtractedPayload {
                name: Some("Mock Pattern".to_string()),
                ..Default::default()
            },
            by_content: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Payload returned for content with no specific script.
    pub fn with_default_payload(mut self, payload: ExtractedPayload) -> Self {
        self.default_payload = payload;
        self
    }

    /// Payload returned when the raw content equals `content`.
    pub fn with_payload_for(self, content: &str, payload: ExtractedPayload) -> Self {
        self.by_content
            .lock()
            .unwrap()
            .insert(content.to_string(), MockOutcome::Ok(payload));
        self
    }

    pub fn with_failure_for(self, content: &str, reason: &str) -> Self {
        self.by_content
            .lock()
            .unwrap()
            .insert(content.to_string(), MockOutcome::Permanent(reason.to_string()));
        self
    }

    pub fn calls(&self) -> Vec<ExtractCallArgs> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockExtractionOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BaseExtractionOracle for MockExtractionOracle {
    async fn extract(
        &self,
        raw_content: &str,
        metadata: &SourceMetadata,
    ) -> PipelineResult<ExtractedPayload> {
        self.calls.lock().unwrap().push(ExtractCallArgs {
            raw_content: raw_content.to_string(),
            metadata: metadata.clone(),
        });

        let scripted = self.by_content.lock().unwrap().get(raw_content).cloned();
        scripted
            .unwrap_or_else(|| MockOutcome::Ok(self.default_payload.clone()))
            .into_result()
    }
}

// =============================================================================
// TestDependencies
// =============================================================================

/// Mock collaborators plus handles for asserting on them.
pub struct TestDependencies {
    pub fetcher: Arc<MockContentFetcher>,
    pub oracle: Arc<MockExtractionOracle>,
}

impl TestDependencies {
    pub fn new(fetcher: MockContentFetcher, oracle: MockExtractionOracle) -> Self {
        Self {
            fetcher: Arc::new(fetcher),
            oracle: Arc::new(oracle),
        }
    }

    /// Pipeline dependencies with no rate limiting and millisecond backoff.
    pub fn pipeline_deps(&self, db_pool: PgPool, concurrency: usize) -> PipelineDeps {
        PipelineDeps::new(
            db_pool,
            self.fetcher.clone(),
            self.oracle.clone(),
            Arc::new(DomainRateLimiter::new(Duration::ZERO)),
            RetryPolicy {
                max_attempts: 3,
                base_delay: Duration::from_millis(1),
            },
            ScoringConfig::default(),
            concurrency,
        )
    }
}
