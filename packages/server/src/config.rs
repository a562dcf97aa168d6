use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

use crate::domains::extraction::ScoringConfig;
use crate::domains::review::QueueOrder;
use crate::kernel::RetryPolicy;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// HTTP endpoint of the extraction oracle. Scraping is disabled without it.
    pub oracle_url: Option<String>,
    pub scrape_concurrency: usize,
    pub retry_policy: RetryPolicy,
    pub domain_min_interval: Duration,
    pub queue_order: QueueOrder,
    pub scoring: ScoringConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let max_attempts: u32 = env::var("SCRAPE_MAX_ATTEMPTS")
            .unwrap_or_else(|_| "3".to_string())
            .parse()
            .context("SCRAPE_MAX_ATTEMPTS must be a valid number")?;
        let base_delay_ms: u64 = env::var("SCRAPE_BASE_DELAY_MS")
            .unwrap_or_else(|_| "2000".to_string())
            .parse()
            .context("SCRAPE_BASE_DELAY_MS must be a valid number")?;
        let domain_interval_ms: u64 = env::var("DOMAIN_MIN_INTERVAL_MS")
            .unwrap_or_else(|_| "1000".to_string())
            .parse()
            .context("DOMAIN_MIN_INTERVAL_MS must be a valid number")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            oracle_url: env::var("ORACLE_URL").ok(),
            scrape_concurrency: env::var("SCRAPE_CONCURRENCY")
                .unwrap_or_else(|_| "4".to_string())
                .parse()
                .context("SCRAPE_CONCURRENCY must be a valid number")?,
            retry_policy: RetryPolicy {
                max_attempts: max_attempts.max(1),
                base_delay: Duration::from_millis(base_delay_ms),
            },
            domain_min_interval: Duration::from_millis(domain_interval_ms),
            queue_order: env::var("REVIEW_QUEUE_ORDER")
                .unwrap_or_else(|_| "desc".to_string())
                .parse()
                .context("REVIEW_QUEUE_ORDER must be 'asc' or 'desc'")?,
            scoring: ScoringConfig {
                min_description_length: env::var("MIN_DESCRIPTION_LENGTH")
                    .unwrap_or_else(|_| "50".to_string())
                    .parse()
                    .context("MIN_DESCRIPTION_LENGTH must be a valid number")?,
            },
        })
    }
}
