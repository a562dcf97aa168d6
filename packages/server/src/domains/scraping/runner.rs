//! Scrape runner - discovered sources through fetch, oracle and submission
//!
//! Sources are processed with bounded concurrency. Every external call goes
//! through the per-domain rate limiter and the retry policy; permanent
//! failures and exhausted retry budgets mark the source failed.

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{info, warn};

use crate::common::utils::domain_of;
use crate::common::{PipelineError, PipelineResult, SourceId};
use crate::domains::extraction::submit_extraction;
use crate::domains::source::{mark_failed, mark_scraped, Source, SourceStatus};
use crate::kernel::{retry_with_backoff, PipelineDeps};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeFailure {
    pub source_id: SourceId,
    pub url: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeRunReport {
    pub processed: usize,
    pub scraped: usize,
    pub extracted: usize,
    pub failed: usize,
    pub failures: Vec<ScrapeFailure>,
}

#[derive(Debug)]
enum Outcome {
    Extracted,
    /// Content was stored but no extraction was produced.
    ScrapedThenFailed(ScrapeFailure),
    Failed(ScrapeFailure),
}

pub struct ScrapeRunner {
    deps: PipelineDeps,
}

impl ScrapeRunner {
    pub fn new(deps: PipelineDeps) -> Self {
        Self { deps }
    }

    /// Process up to `limit` discovered sources, oldest first.
    pub async fn run_discovered(&self, limit: i64) -> PipelineResult<ScrapeRunReport> {
        let sources = Source::find_by_status(SourceStatus::Discovered, limit, &self.deps.db_pool).await?;
        info!(
            sources = sources.len(),
            concurrency = self.deps.concurrency,
            "Starting scrape run"
        );

        let outcomes: Vec<Outcome> = stream::iter(sources)
            .map(|source| self.process(source))
            .buffer_unordered(self.deps.concurrency)
            .collect()
            .await;

        let mut report = ScrapeRunReport {
            processed: outcomes.len(),
            ..Default::default()
        };
        for outcome in outcomes {
            match outcome {
                Outcome::Extracted => {
                    report.scraped += 1;
                    report.extracted += 1;
                }
                Outcome::ScrapedThenFailed(failure) => {
                    report.scraped += 1;
                    report.failed += 1;
                    report.failures.push(failure);
                }
                Outcome::Failed(failure) => {
                    report.failed += 1;
                    report.failures.push(failure);
                }
            }
        }

        info!(
            processed = report.processed,
            scraped = report.scraped,
            extracted = report.extracted,
            failed = report.failed,
            "Scrape run finished"
        );
        Ok(report)
    }

    async fn process(&self, source: Source) -> Outcome {
        let deps = &self.deps;
        let pool = &deps.db_pool;

        let Some(domain) = domain_of(&source.url) else {
            let error = PipelineError::PermanentSource(format!("no host in URL {}", source.url));
            return Outcome::Failed(self.fail(&source, error).await);
        };

        let limiter = deps.rate_limiter.as_ref();
        let fetcher = deps.fetcher.as_ref();
        let url = source.url.as_str();
        let host = domain.as_str();
        let fetched = retry_with_backoff(&deps.retry_policy, "fetch", move || async move {
            limiter.acquire(host).await;
            fetcher.fetch(url).await
        })
        .await;
        let fetched = match fetched {
            Ok(fetched) => fetched,
            Err(e) => return Outcome::Failed(self.fail(&source, e).await),
        };

        if let Err(e) = mark_scraped(source.id, &fetched.markdown, pool).await {
            return Outcome::Failed(self.fail(&source, e).await);
        }

        let mut metadata = source.metadata();
        if metadata.title.is_none() {
            metadata.title = fetched.title.clone();
        }
        let oracle = deps.oracle.as_ref();
        let content = fetched.markdown.as_str();
        let metadata_ref = &metadata;
        let payload = retry_with_backoff(&deps.retry_policy, "extract", move || async move {
            oracle.extract(content, metadata_ref).await
        })
        .await;
        let payload = match payload {
            Ok(payload) => payload,
            Err(e) => return Outcome::ScrapedThenFailed(self.fail(&source, e).await),
        };

        match submit_extraction(source.id, payload, &deps.scoring, pool).await {
            Ok(_) => Outcome::Extracted,
            Err(e) => Outcome::ScrapedThenFailed(self.fail(&source, e).await),
        }
    }

    /// Record a per-item failure, marking the source failed where the
    /// error says the source itself is bad or retries ran out.
    async fn fail(&self, source: &Source, error: PipelineError) -> ScrapeFailure {
        let reason = error.to_string();
        let marks_failed = matches!(
            error,
            PipelineError::PermanentSource(_)
                | PipelineError::TransientNetwork(_)
                | PipelineError::Validation(_)
        );

        if marks_failed {
            if let Err(e) = mark_failed(source.id, &reason, &self.deps.db_pool).await {
                warn!(source_id = %source.id, error = %e, "Could not mark source failed");
            }
        } else {
            warn!(source_id = %source.id, error = %reason, "Source left unchanged");
        }

        ScrapeFailure {
            source_id: source.id,
            url: source.url.clone(),
            reason,
        }
    }
}
