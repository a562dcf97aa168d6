use thiserror::Error;

/// Errors surfaced by pipeline operations.
///
/// Transient network errors are the only kind retried automatically; every
/// other kind is reported to the operator or reviewer as-is.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// Retryable scrape or oracle failure (timeouts, 5xx, 429, connection resets).
    #[error("transient network error: {0}")]
    TransientNetwork(String),

    /// Bad URL or unsupported/malformed content. Marks the source failed.
    #[error("permanent source error: {0}")]
    PermanentSource(String),

    /// Extraction is missing mandatory fields or carries invalid values.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A concurrent status transition won the race. Refetch and retry manually.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The ingestion target already exists as a user-submitted pattern.
    #[error("identity '{identity_key}' already exists as a user-submitted pattern")]
    DuplicateIdentity { identity_key: String },

    /// Failure inside the atomic merge. Fully rolled back.
    #[error("ingestion transaction failed: {0}")]
    IngestionTransaction(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether the operation may be retried locally within a retry budget.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientNetwork(_))
    }

    /// Stable machine-readable kind, used in API payloads and batch logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TransientNetwork(_) => "transient_network",
            Self::PermanentSource(_) => "permanent_source",
            Self::Validation(_) => "validation",
            Self::Conflict(_) => "conflict",
            Self::DuplicateIdentity { .. } => "duplicate_identity",
            Self::IngestionTransaction(_) => "ingestion_transaction",
            Self::NotFound { .. } => "not_found",
            Self::Database(_) => "database",
            Self::Internal(_) => "internal",
        }
    }
}
