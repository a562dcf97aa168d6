//! Integration tests for the extraction store: submission, normalization and
//! payload corrections.

mod common;

use crate::common::{
    complete_payload, discovered_source, extraction_for, material, page_url, scraped_source,
    sparse_payload, TestHarness,
};
use flybox_core::common::PipelineError;
use flybox_core::domains::extraction::{
    normalize_extraction, submit_extraction, update_extraction_payload, ConfidenceBucket,
    ExtractedPayload, Extraction, ExtractionStatus, MaterialType, ScoringConfig,
};
use flybox_core::domains::review::reject_extraction;
use flybox_core::domains::source::{Source, SourceType};
use test_context::test_context;

#[test_context(TestHarness)]
#[tokio::test]
async fn submit_scores_and_moves_source_to_extracted(ctx: &TestHarness) {
    let source = scraped_source(&ctx.db_pool, &page_url("woolly-bugger")).await.unwrap();

    let extraction = submit_extraction(
        source.id,
        complete_payload("Woolly Bugger"),
        &ScoringConfig::default(),
        &ctx.db_pool,
    )
    .await
    .expect("submit");

    assert_eq!(extraction.status().unwrap(), ExtractionStatus::Extracted);
    assert!(extraction.confidence >= 0.8);
    assert_eq!(extraction.bucket(), ConfidenceBucket::High);
    assert_eq!(extraction.identity_key.as_deref(), Some("woolly-bugger"));
    assert!(extraction.ingested_pattern_id.is_none());

    let source = Source::find_by_id(source.id, &ctx.db_pool).await.unwrap();
    assert_eq!(source.status, "extracted");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn submit_requires_scraped_source(ctx: &TestHarness) {
    let source = discovered_source(&ctx.db_pool, &page_url("not-yet"), SourceType::Article)
        .await
        .unwrap();

    let err = submit_extraction(
        source.id,
        sparse_payload("Griffith's Gnat"),
        &ScoringConfig::default(),
        &ctx.db_pool,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::Conflict(_)), "got {:?}", err);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM extractions")
        .fetch_one(&ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn sparse_payload_is_kept_with_low_confidence(ctx: &TestHarness) {
    let extraction = extraction_for(&ctx.db_pool, "sparse", ExtractedPayload::default())
        .await
        .expect("partial records are stored");

    assert_eq!(extraction.confidence, 0.0);
    assert_eq!(extraction.bucket(), ConfidenceBucket::Low);
    assert!(extraction.pattern_name.is_none());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn invalid_payload_is_rejected_on_ingress(ctx: &TestHarness) {
    let source = scraped_source(&ctx.db_pool, &page_url("bad-material")).await.unwrap();
    let mut payload = sparse_payload("Bad Material");
    payload.materials.push(material(MaterialType::Thread, "   "));

    let err = submit_extraction(source.id, payload, &ScoringConfig::default(), &ctx.db_pool)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));

    let source = Source::find_by_id(source.id, &ctx.db_pool).await.unwrap();
    assert_eq!(source.status, "scraped");
}

#[test_context(TestHarness)]
#[tokio::test]
async fn normalize_canonicalizes_and_rescores(ctx: &TestHarness) {
    let mut payload = complete_payload("  Woolly   Bugger ");
    payload.materials.push(material(MaterialType::Hook, "Streamer hook 3XL"));
    let extraction = extraction_for(&ctx.db_pool, "messy", payload).await.unwrap();

    let normalized = normalize_extraction(extraction.id, &ScoringConfig::default(), &ctx.db_pool)
        .await
        .expect("normalize");

    assert_eq!(normalized.status().unwrap(), ExtractionStatus::Normalized);
    assert_eq!(normalized.payload().materials.len(), 5);
    assert_eq!(normalized.pattern_name.as_deref(), Some("Woolly   Bugger"));
    assert_eq!(normalized.identity_key.as_deref(), Some("woolly-bugger"));
    assert!(normalized.confidence >= 0.8);

    let err = normalize_extraction(extraction.id, &ScoringConfig::default(), &ctx.db_pool)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Conflict(_)), "got {:?}", err);

    let stored = Extraction::find_by_id(extraction.id, &ctx.db_pool).await.unwrap();
    assert_eq!(stored.updated_at, normalized.updated_at);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn stale_payload_write_is_refused(ctx: &TestHarness) {
    let extraction = extraction_for(&ctx.db_pool, "stale", sparse_payload("Copper John"))
        .await
        .unwrap();

    // A reviewer correction lands after `extraction` was read.
    let corrected = update_extraction_payload(
        extraction.id,
        complete_payload("Copper John"),
        &ScoringConfig::default(),
        &ctx.db_pool,
    )
    .await
    .unwrap();

    let stale = extraction.payload().normalized();
    let written = Extraction::replace_payload(
        extraction.id,
        &stale,
        0.25,
        &[ExtractionStatus::Extracted],
        ExtractionStatus::Normalized,
        extraction.updated_at,
        &ctx.db_pool,
    )
    .await
    .unwrap();
    assert!(written.is_none());

    let stored = Extraction::find_by_id(extraction.id, &ctx.db_pool).await.unwrap();
    assert_eq!(stored.status().unwrap(), ExtractionStatus::Extracted);
    assert_eq!(stored.confidence, corrected.confidence);
    assert_eq!(stored.payload().materials.len(), 5);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn approval_of_a_stale_read_is_refused(ctx: &TestHarness) {
    let extraction = extraction_for(&ctx.db_pool, "swap", complete_payload("Prince Nymph"))
        .await
        .unwrap();

    let mut emptied = complete_payload("Prince Nymph");
    emptied.materials.clear();
    update_extraction_payload(extraction.id, emptied, &ScoringConfig::default(), &ctx.db_pool)
        .await
        .unwrap();

    // The approval was validated against the payload read before the edit.
    let approved = Extraction::transition_reviewed(
        extraction.id,
        ExtractionStatus::PENDING,
        ExtractionStatus::Approved,
        "reviewer",
        None,
        Some(extraction.updated_at),
        &ctx.db_pool,
    )
    .await
    .unwrap();
    assert!(approved.is_none());

    let stored = Extraction::find_by_id(extraction.id, &ctx.db_pool).await.unwrap();
    assert_eq!(stored.status().unwrap(), ExtractionStatus::Extracted);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn payload_update_recomputes_confidence(ctx: &TestHarness) {
    let extraction = extraction_for(&ctx.db_pool, "upgrade", sparse_payload("Elk Hair Caddis"))
        .await
        .unwrap();
    assert!(extraction.confidence < 0.4);

    let updated = update_extraction_payload(
        extraction.id,
        complete_payload("Elk Hair Caddis"),
        &ScoringConfig::default(),
        &ctx.db_pool,
    )
    .await
    .expect("update");

    assert!(updated.confidence >= 0.8);
    assert_eq!(updated.status().unwrap(), ExtractionStatus::Extracted);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn payload_update_after_review_is_a_conflict(ctx: &TestHarness) {
    let extraction = extraction_for(&ctx.db_pool, "reviewed", sparse_payload("Hare's Ear"))
        .await
        .unwrap();
    reject_extraction(extraction.id, "reviewer", "duplicate of an existing page", &ctx.db_pool)
        .await
        .unwrap();

    let err = update_extraction_payload(
        extraction.id,
        complete_payload("Hare's Ear"),
        &ScoringConfig::default(),
        &ctx.db_pool,
    )
    .await
    .unwrap_err();
    assert!(matches!(err, PipelineError::Conflict(_)));

    let stored = Extraction::find_by_id(extraction.id, &ctx.db_pool).await.unwrap();
    assert_eq!(stored.status().unwrap(), ExtractionStatus::Rejected);
}
