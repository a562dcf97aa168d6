//! Test fixtures for creating test data.
//!
//! These fixtures go through the public actions so every row they create is
//! in a state the pipeline itself could have produced.

use anyhow::Result;
use flybox_core::domains::extraction::{
    submit_extraction, ExtractedPayload, Extraction, MaterialEntry, MaterialType, ResourceEntry,
    ResourceType, ScoringConfig,
};
use flybox_core::domains::extraction::models::{Difficulty, PatternCategory, WaterType};
use flybox_core::domains::review::{approve_extraction, ApprovalOutcome};
use flybox_core::domains::source::{
    mark_scraped, register_source, NewSource, Source, SourceMetadata, SourceType,
};
use sqlx::PgPool;

pub const REVIEWER: &str = "reviewer@flybox.test";

pub fn material(material_type: MaterialType, name: &str) -> MaterialEntry {
    MaterialEntry {
        material_type,
        name: name.to_string(),
        color: None,
        size: None,
        required: true,
    }
}

/// Complete payload: five materials including hook and thread, full
/// classification, long description and origin. Scores 1.0.
pub fn complete_payload(name: &str) -> ExtractedPayload {
    ExtractedPayload {
        name: Some(name.to_string()),
        category: Some(PatternCategory::Streamer),
        difficulty: Some(Difficulty::Beginner),
        water_type: Some(WaterType::Freshwater),
        origin: Some("Russell Blessing, Pennsylvania, 1967".to_string()),
        description: Some(
            "A marabou-tailed streamer that imitates leeches, baitfish and crayfish. \
             Fish it stripped or dead-drifted."
                .to_string(),
        ),
        instructions: vec![
            "Wrap the shank with lead wire".to_string(),
            "Tie in the marabou tail".to_string(),
            "Palmer the hackle over the chenille body".to_string(),
        ],
        materials: vec![
            material(MaterialType::Hook, "Streamer hook 3XL"),
            material(MaterialType::Thread, "6/0 black"),
            material(MaterialType::Tail, "Marabou"),
            material(MaterialType::Body, "Chenille"),
            material(MaterialType::Hackle, "Saddle hackle"),
        ],
        resources: vec![ResourceEntry {
            resource_type: ResourceType::Video,
            url: format!("https://videos.flybox.test/{}", name.to_lowercase().replace(' ', "-")),
            title: None,
        }],
        ..Default::default()
    }
}

/// Name plus one material: approvable but low confidence.
pub fn sparse_payload(name: &str) -> ExtractedPayload {
    ExtractedPayload {
        name: Some(name.to_string()),
        materials: vec![material(MaterialType::Hook, "Dry fly hook")],
        ..Default::default()
    }
}

pub fn page_url(slug: &str) -> String {
    format!("https://patterns.flybox.test/{}", slug)
}

pub async fn discovered_source(pool: &PgPool, url: &str, source_type: SourceType) -> Result<Source> {
    let source = register_source(
        NewSource {
            url: url.to_string(),
            source_type,
            discovery_query: Some("fly tying patterns".to_string()),
            metadata: SourceMetadata::default(),
        },
        pool,
    )
    .await?;
    Ok(source)
}

pub async fn scraped_source(pool: &PgPool, url: &str) -> Result<Source> {
    let source = discovered_source(pool, url, SourceType::Article).await?;
    let source = mark_scraped(source.id, &format!("# Raw content for {}", url), pool).await?;
    Ok(source)
}

/// Register, scrape and extract one source of the given type.
pub async fn extraction_of_type(
    pool: &PgPool,
    slug: &str,
    source_type: SourceType,
    payload: ExtractedPayload,
) -> Result<Extraction> {
    let url = page_url(slug);
    let source = discovered_source(pool, &url, source_type).await?;
    mark_scraped(source.id, &format!("# Raw content for {}", url), pool).await?;
    let extraction = submit_extraction(source.id, payload, &ScoringConfig::default(), pool).await?;
    Ok(extraction)
}

pub async fn extraction_for(pool: &PgPool, slug: &str, payload: ExtractedPayload) -> Result<Extraction> {
    extraction_of_type(pool, slug, SourceType::Article, payload).await
}

/// Extraction approved and ingested in one step.
pub async fn ingested_extraction(
    pool: &PgPool,
    slug: &str,
    payload: ExtractedPayload,
) -> Result<ApprovalOutcome> {
    let extraction = extraction_for(pool, slug, payload).await?;
    let outcome = approve_extraction(extraction.id, REVIEWER, None, pool).await?;
    Ok(outcome)
}
