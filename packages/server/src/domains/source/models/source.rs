use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};

use crate::common::string_enum::string_enum;
use crate::common::SourceId;

/// Source - a discovered piece of external content that may describe a pattern.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: SourceId,
    pub url: String,
    pub source_type: String, // 'article', 'video', 'pdf', 'other'
    pub title: Option<String>,
    pub creator: Option<String>,
    pub platform: Option<String>,
    pub discovery_query: Option<String>,
    pub status: String, // 'discovered', 'scraped', 'extracted', 'failed'
    #[serde(skip_serializing)]
    pub raw_content: Option<String>,
    pub content_hash: Option<String>,
    pub failure_reason: Option<String>,
    pub scraped_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

string_enum! {
    pub enum SourceType {
        Article => "article" | "blog" | "web",
        Video => "video" | "youtube",
        Pdf => "pdf",
        Other => "other",
    }
}

string_enum! {
    pub enum SourceStatus {
        Discovered => "discovered",
        Scraped => "scraped",
        Extracted => "extracted",
        Failed => "failed",
    }
}

impl SourceStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SourceStatus::Extracted | SourceStatus::Failed)
    }
}

/// Descriptive metadata captured at discovery time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    pub title: Option<String>,
    pub creator: Option<String>,
    pub platform: Option<String>,
}

impl Source {
    pub fn status(&self) -> Result<SourceStatus> {
        self.status.parse()
    }

    pub fn source_type(&self) -> Result<SourceType> {
        self.source_type.parse()
    }

    pub fn metadata(&self) -> SourceMetadata {
        SourceMetadata {
            title: self.title.clone(),
            creator: self.creator.clone(),
            platform: self.platform.clone(),
        }
    }

    pub async fn find_by_id(id: SourceId, pool: &PgPool) -> Result<Self> {
        sqlx::query_as::<_, Self>("SELECT * FROM sources WHERE id = $1")
            .bind(id)
            .fetch_one(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_id_optional(id: SourceId, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM sources WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    pub async fn find_by_url(url: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>("SELECT * FROM sources WHERE url = $1")
            .bind(url)
            .fetch_optional(pool)
            .await
            .map_err(Into::into)
    }

    /// Oldest-first batch of sources in the given status.
    pub async fn find_by_status(status: SourceStatus, limit: i64, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM sources WHERE status = $1 ORDER BY created_at, id LIMIT $2",
        )
        .bind(status.as_str())
        .bind(limit)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Other sources whose scraped content hashes identically.
    pub async fn find_by_content_hash(hash: &str, exclude: SourceId, pool: &PgPool) -> Result<Vec<Self>> {
        sqlx::query_as::<_, Self>(
            "SELECT * FROM sources WHERE content_hash = $1 AND id <> $2 ORDER BY created_at",
        )
        .bind(hash)
        .bind(exclude)
        .fetch_all(pool)
        .await
        .map_err(Into::into)
    }

    /// Insert unless the URL is already known. Returns `None` on conflict.
    pub async fn insert_if_absent(
        url: &str,
        source_type: SourceType,
        discovery_query: Option<&str>,
        metadata: &SourceMetadata,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            INSERT INTO sources (id, url, source_type, title, creator, platform, discovery_query, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'discovered')
            ON CONFLICT (url) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(SourceId::new())
        .bind(url)
        .bind(source_type.as_str())
        .bind(&metadata.title)
        .bind(&metadata.creator)
        .bind(&metadata.platform)
        .bind(discovery_query)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// `discovered -> scraped`. Returns `None` if the source was not `discovered`.
    pub async fn mark_scraped(
        id: SourceId,
        raw_content: &str,
        content_hash: &str,
        pool: &PgPool,
    ) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE sources
            SET status = 'scraped', raw_content = $2, content_hash = $3,
                scraped_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'discovered'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(raw_content)
        .bind(content_hash)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// `discovered|scraped -> failed`. Returns `None` from any other status.
    pub async fn mark_failed(id: SourceId, reason: &str, pool: &PgPool) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE sources
            SET status = 'failed', failure_reason = $2, updated_at = NOW()
            WHERE id = $1 AND status IN ('discovered', 'scraped')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(reason)
        .fetch_optional(pool)
        .await
        .map_err(Into::into)
    }

    /// `scraped -> extracted`, run inside the extraction submission transaction.
    pub async fn mark_extracted(id: SourceId, conn: &mut PgConnection) -> Result<Option<Self>> {
        sqlx::query_as::<_, Self>(
            r#"
            UPDATE sources
            SET status = 'extracted', updated_at = NOW()
            WHERE id = $1 AND status = 'scraped'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await
        .map_err(Into::into)
    }
}
