//! Per-domain request spacing for scraping.
//!
//! Each host gets its own GCRA cell (governor keyed state), allowing one
//! request per `min_interval` with no burst. Workers hitting different hosts
//! never wait on each other.

use std::time::Duration;

use governor::clock::DefaultClock;
use governor::state::keyed::DefaultKeyedStateStore;
use governor::{Quota, RateLimiter};
use tracing::debug;

type KeyedRateLimiter = RateLimiter<String, DefaultKeyedStateStore<String>, DefaultClock>;

pub struct DomainRateLimiter {
    min_interval: Duration,
    /// `None` when the interval is zero (rate limiting disabled).
    limiter: Option<KeyedRateLimiter>,
}

impl DomainRateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        let limiter = Quota::with_period(min_interval).map(RateLimiter::keyed);
        Self {
            min_interval,
            limiter,
        }
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Wait until a request to `domain` is allowed.
    pub async fn acquire(&self, domain: &str) {
        let Some(limiter) = &self.limiter else {
            return;
        };
        let key = domain.to_string();
        if limiter.check_key(&key).is_ok() {
            return;
        }
        debug!(domain = %domain, "Rate limiting domain");
        limiter.until_key_ready(&key).await;
    }
}
