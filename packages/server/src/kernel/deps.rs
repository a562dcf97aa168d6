//! Pipeline dependencies (using traits for testability)
//!
//! Central container handed to the scrape runner. All external services use
//! trait abstractions so tests can swap in the mocks from `test_dependencies`.

use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::PgPool;

use crate::config::Config;
use crate::domains::extraction::ScoringConfig;
use crate::kernel::{
    BaseContentFetcher, BaseExtractionOracle, DomainRateLimiter, HttpExtractionOracle,
    RetryPolicy, SimpleFetcher,
};

#[derive(Clone)]
pub struct PipelineDeps {
    pub db_pool: PgPool,
    pub fetcher: Arc<dyn BaseContentFetcher>,
    pub oracle: Arc<dyn BaseExtractionOracle>,
    pub rate_limiter: Arc<DomainRateLimiter>,
    pub retry_policy: RetryPolicy,
    pub scoring: ScoringConfig,
    /// Maximum sources processed at once.
    pub concurrency: usize,
}

impl PipelineDeps {
    pub fn new(
        db_pool: PgPool,
        fetcher: Arc<dyn BaseContentFetcher>,
        oracle: Arc<dyn BaseExtractionOracle>,
        rate_limiter: Arc<DomainRateLimiter>,
        retry_policy: RetryPolicy,
        scoring: ScoringConfig,
        concurrency: usize,
    ) -> Self {
        Self {
            db_pool,
            fetcher,
            oracle,
            rate_limiter,
            retry_policy,
            scoring,
            concurrency: concurrency.max(1),
        }
    }

    /// Production wiring: `SimpleFetcher` plus the HTTP oracle at `ORACLE_URL`.
    pub fn from_config(config: &Config, db_pool: PgPool) -> Result<Self> {
        let oracle_url = config
            .oracle_url
            .as_deref()
            .context("ORACLE_URL must be set to run the scraper")?;

        Ok(Self::new(
            db_pool,
            Arc::new(SimpleFetcher::new()?),
            Arc::new(HttpExtractionOracle::new(oracle_url)?),
            Arc::new(DomainRateLimiter::new(config.domain_min_interval)),
            config.retry_policy,
            config.scoring,
            config.scrape_concurrency,
        ))
    }
}
