//! Operator CLI for the pattern pipeline
//!
//! Batch commands print JSON to stdout; `audit` prints a human-readable
//! summary and optionally writes the JSON report to a file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use flybox_core::common::ExtractionId;
use flybox_core::config::Config;
use flybox_core::domains::audit::{audit_catalog, load_expected_names, CatalogSnapshot};
use flybox_core::domains::catalog::load_snapshot;
use flybox_core::domains::ingestion::retry_approved;
use flybox_core::domains::reset::{reset_ingested, ResetFilter};
use flybox_core::domains::scraping::ScrapeRunner;
use flybox_core::domains::source::{register_source, NewSource, SourceMetadata, SourceType};
use flybox_core::domains::stats::PipelineStats;
use flybox_core::kernel::PipelineDeps;
use serde::Serialize;
use sqlx::PgPool;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pipeline_cli")]
#[command(about = "Operator commands for the pattern pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a discovered URL
    Register {
        url: String,
        #[arg(long, default_value = "article")]
        source_type: SourceType,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        creator: Option<String>,
        #[arg(long)]
        query: Option<String>,
    },

    /// Scrape and extract discovered sources once
    Scrape {
        #[arg(long, default_value_t = 50)]
        limit: i64,
    },

    /// Re-attempt ingestion of every approved extraction
    RetryIngest,

    /// Undo ingestion for matching extractions
    Reset {
        #[arg(long)]
        source_type: Option<SourceType>,
        /// Inclusive RFC 3339 lower bound on ingestion time
        #[arg(long)]
        since: Option<DateTime<Utc>>,
        /// Exclusive RFC 3339 upper bound on ingestion time
        #[arg(long)]
        until: Option<DateTime<Utc>>,
        #[arg(long = "extraction-id")]
        extraction_ids: Vec<ExtractionId>,
    },

    /// Completeness audit of the catalog
    Audit {
        /// Audit a JSON snapshot instead of the live catalog
        #[arg(long)]
        snapshot: Option<PathBuf>,
        /// Newline-separated list of pattern names the catalog should contain
        #[arg(long)]
        expected: Option<PathBuf>,
        /// Write the JSON report here
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Print pipeline counts
    Stats,
}

fn output<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,flybox_core=debug,sqlx=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Register {
            url,
            source_type,
            title,
            creator,
            query,
        } => {
            let pool = get_pool().await?;
            let input = NewSource {
                url,
                source_type,
                discovery_query: query,
                metadata: SourceMetadata {
                    title,
                    creator,
                    platform: None,
                },
            };
            output(&register_source(input, &pool).await?)
        }
        Commands::Scrape { limit } => {
            let config = load_config()?;
            let pool = get_pool().await?;
            let runner = ScrapeRunner::new(PipelineDeps::from_config(&config, pool)?);
            output(&runner.run_discovered(limit).await?)
        }
        Commands::RetryIngest => {
            let pool = get_pool().await?;
            output(&retry_approved(&pool).await?)
        }
        Commands::Reset {
            source_type,
            since,
            until,
            extraction_ids,
        } => {
            let pool = get_pool().await?;
            let filter = ResetFilter {
                source_type,
                ingested_since: since,
                ingested_until: until,
                extraction_ids: (!extraction_ids.is_empty()).then_some(extraction_ids),
            };
            output(&reset_ingested(&filter, &pool).await?)
        }
        Commands::Audit {
            snapshot,
            expected,
            out,
        } => cmd_audit(snapshot, expected, out).await,
        Commands::Stats => {
            let pool = get_pool().await?;
            output(&PipelineStats::load(&pool).await?)
        }
    }
}

fn load_config() -> Result<Config> {
    Config::from_env().context("Failed to load configuration")
}

async fn get_pool() -> Result<PgPool> {
    let config = load_config()?;
    let pool = PgPool::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    Ok(pool)
}

async fn cmd_audit(
    snapshot: Option<PathBuf>,
    expected: Option<PathBuf>,
    out: Option<PathBuf>,
) -> Result<()> {
    let snapshot = match snapshot {
        Some(path) => CatalogSnapshot::from_file(&path)?,
        None => load_snapshot(&get_pool().await?).await?,
    };
    let expected = match expected {
        Some(path) => load_expected_names(&path)?,
        None => Vec::new(),
    };

    let report = audit_catalog(&snapshot, &expected);
    if let Some(path) = out {
        std::fs::write(&path, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::info!(path = %path.display(), "Audit report written");
    }
    println!("{}", report.summary());
    Ok(())
}
