use std::time::Duration;

use axum::{extract::Extension, http::StatusCode, Json};
use serde::Serialize;
use sqlx::PgPool;

use crate::server::app::AppState;

const DB_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    database: DatabaseHealth,
    connection_pool: ConnectionPoolHealth,
    #[serde(skip_serializing_if = "Option::is_none")]
    pipeline: Option<PipelineBacklog>,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    status: &'static str,
    /// Latest applied schema migration.
    #[serde(skip_serializing_if = "Option::is_none")]
    schema_version: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

#[derive(Serialize)]
pub struct ConnectionPoolHealth {
    size: u32,
    idle_connections: usize,
    max_connections: u32,
}

/// Work waiting at each hand-off point of the pipeline.
#[derive(Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PipelineBacklog {
    sources_awaiting_scrape: i64,
    sources_awaiting_extraction: i64,
    extractions_awaiting_review: i64,
    extractions_awaiting_ingestion: i64,
}

async fn load_backlog(pool: &PgPool) -> sqlx::Result<(Option<i64>, PipelineBacklog)> {
    let schema_version = sqlx::query_scalar::<_, Option<i64>>(
        "SELECT MAX(version) FROM _sqlx_migrations WHERE success",
    )
    .fetch_one(pool)
    .await?;

    let backlog = sqlx::query_as::<_, PipelineBacklog>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM sources WHERE status = 'discovered') AS sources_awaiting_scrape,
            (SELECT COUNT(*) FROM sources WHERE status = 'scraped') AS sources_awaiting_extraction,
            (SELECT COUNT(*) FROM extractions WHERE status IN ('extracted', 'normalized'))
                AS extractions_awaiting_review,
            (SELECT COUNT(*) FROM extractions WHERE status = 'approved')
                AS extractions_awaiting_ingestion
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok((schema_version, backlog))
}

/// Health check endpoint
///
/// Reports database reachability, the applied schema version, pool usage and
/// the pipeline backlog (sources to scrape or extract, extractions waiting on
/// a reviewer, approvals not yet ingested). Returns 503 Service Unavailable
/// when the database does not answer within five seconds.
pub async fn health_handler(
    Extension(state): Extension<AppState>,
) -> (StatusCode, Json<HealthResponse>) {
    let (database, pipeline) =
        match tokio::time::timeout(DB_TIMEOUT, load_backlog(&state.db_pool)).await {
            Ok(Ok((schema_version, backlog))) => (
                DatabaseHealth {
                    status: "ok",
                    schema_version,
                    error: None,
                },
                Some(backlog),
            ),
            Ok(Err(e)) => (
                DatabaseHealth {
                    status: "error",
                    schema_version: None,
                    error: Some(format!("Query failed: {}", e)),
                },
                None,
            ),
            Err(_) => (
                DatabaseHealth {
                    status: "error",
                    schema_version: None,
                    error: Some(format!("Query timeout (>{}s)", DB_TIMEOUT.as_secs())),
                },
                None,
            ),
        };

    let connection_pool = ConnectionPoolHealth {
        size: state.db_pool.size(),
        idle_connections: state.db_pool.num_idle(),
        max_connections: state.db_pool.options().get_max_connections(),
    };

    let is_healthy = pipeline.is_some();
    let status_code = if is_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if is_healthy { "healthy" } else { "unhealthy" },
            database,
            connection_pool,
            pipeline,
        }),
    )
}
