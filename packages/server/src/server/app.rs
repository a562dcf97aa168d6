use axum::{
    extract::Extension,
    http::{header::CONTENT_TYPE, HeaderName, Method},
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::domains::extraction::ScoringConfig;
use crate::domains::review::QueueOrder;
use crate::server::routes::{
    approve_handler, get_extraction_handler, health_handler, list_extractions_handler,
    reject_handler, stats_handler,
};
use crate::Config;

/// Shared state handed to every handler via `Extension`.
#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub queue_order: QueueOrder,
    pub scoring: ScoringConfig,
}

impl AppState {
    pub fn from_config(db_pool: PgPool, config: &Config) -> Self {
        Self {
            db_pool,
            queue_order: config.queue_order,
            scoring: config.scoring,
        }
    }
}

/// Header carrying the reviewer identity on decision requests.
pub const REVIEWER_HEADER: &str = "x-reviewer";

/// Build the Axum application router
pub fn build_app(app_state: AppState) -> Router {
    // CORS configuration - allow any origin for development
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(REVIEWER_HEADER)]);

    Router::new()
        .route("/health", get(health_handler))
        .route("/pipeline/extractions", get(list_extractions_handler))
        .route("/pipeline/extractions/:id", get(get_extraction_handler))
        .route("/pipeline/extractions/:id/approve", post(approve_handler))
        .route("/pipeline/extractions/:id/reject", post(reject_handler))
        .route("/pipeline/stats", get(stats_handler))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(Extension(app_state))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
