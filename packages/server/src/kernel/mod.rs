//! Kernel module - pipeline infrastructure and dependencies.

pub mod deps;
pub mod http_oracle;
pub mod rate_limit;
pub mod retry;
pub mod simple_fetcher;
pub mod test_dependencies;
pub mod traits;

pub use deps::PipelineDeps;
pub use http_oracle::HttpExtractionOracle;
pub use rate_limit::DomainRateLimiter;
pub use retry::{retry_with_backoff, RetryPolicy};
pub use simple_fetcher::SimpleFetcher;
pub use test_dependencies::{MockContentFetcher, MockExtractionOracle, TestDependencies};
pub use traits::*;
