//! Integration tests for the review queue and reviewer decisions.

mod common;

use crate::common::{
    complete_payload, extraction_for, extraction_of_type, sparse_payload, TestHarness, REVIEWER,
};
use flybox_core::common::{PageArgs, PipelineError};
use flybox_core::domains::catalog::CanonicalPattern;
use flybox_core::domains::extraction::{ExtractedPayload, Extraction, ExtractionStatus};
use flybox_core::domains::review::{
    approve_extraction, list_pending, reject_extraction, PendingFilter, QueueOrder,
};
use flybox_core::domains::source::SourceType;
use test_context::test_context;

async fn seed_queue(ctx: &TestHarness) -> Vec<Extraction> {
    vec![
        extraction_for(&ctx.db_pool, "low", ExtractedPayload::default()).await.unwrap(),
        extraction_for(&ctx.db_pool, "high", complete_payload("Woolly Bugger")).await.unwrap(),
        extraction_of_type(&ctx.db_pool, "mid", SourceType::Video, sparse_payload("Adams"))
            .await
            .unwrap(),
    ]
}

// =============================================================================
// Queue
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn queue_orders_by_confidence_in_configured_direction(ctx: &TestHarness) {
    seed_queue(ctx).await;

    let desc = list_pending(
        &PendingFilter::default(),
        QueueOrder::Descending,
        PageArgs::default(),
        &ctx.db_pool,
    )
    .await
    .unwrap();
    let confidences: Vec<f64> = desc.items.iter().map(|e| e.confidence).collect();
    assert_eq!(confidences, vec![1.0, 0.25, 0.0]);

    let asc = list_pending(
        &PendingFilter::default(),
        QueueOrder::Ascending,
        PageArgs::default(),
        &ctx.db_pool,
    )
    .await
    .unwrap();
    let confidences: Vec<f64> = asc.items.iter().map(|e| e.confidence).collect();
    assert_eq!(confidences, vec![0.0, 0.25, 1.0]);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn queue_filters_by_range_and_source_type(ctx: &TestHarness) {
    seed_queue(ctx).await;

    let high_only = PendingFilter {
        confidence_min: Some(0.8),
        ..Default::default()
    };
    let page = list_pending(&high_only, QueueOrder::Descending, PageArgs::default(), &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].pattern_name.as_deref(), Some("Woolly Bugger"));

    let videos = PendingFilter {
        source_type: Some(SourceType::Video),
        ..Default::default()
    };
    let page = list_pending(&videos, QueueOrder::Descending, PageArgs::default(), &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].pattern_name.as_deref(), Some("Adams"));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn queue_paginates(ctx: &TestHarness) {
    seed_queue(ctx).await;

    let first = list_pending(
        &PendingFilter::default(),
        QueueOrder::Descending,
        PageArgs::new(Some(2), None),
        &ctx.db_pool,
    )
    .await
    .unwrap();
    assert_eq!(first.items.len(), 2);
    assert!(first.has_more);

    let second = list_pending(
        &PendingFilter::default(),
        QueueOrder::Descending,
        PageArgs::new(Some(2), Some(2)),
        &ctx.db_pool,
    )
    .await
    .unwrap();
    assert_eq!(second.items.len(), 1);
    assert!(!second.has_more);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn decided_extractions_leave_the_queue(ctx: &TestHarness) {
    let queue = seed_queue(ctx).await;
    reject_extraction(queue[0].id, REVIEWER, "nothing usable", &ctx.db_pool)
        .await
        .unwrap();

    let page = list_pending(
        &PendingFilter::default(),
        QueueOrder::Descending,
        PageArgs::default(),
        &ctx.db_pool,
    )
    .await
    .unwrap();
    assert_eq!(page.items.len(), 2);
    assert!(page.items.iter().all(|e| e.id != queue[0].id));

    let rejected = PendingFilter {
        status: Some(ExtractionStatus::Rejected),
        ..Default::default()
    };
    let page = list_pending(&rejected, QueueOrder::Descending, PageArgs::default(), &ctx.db_pool)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
}

// =============================================================================
// Decisions
// =============================================================================

#[test_context(TestHarness)]
#[tokio::test]
async fn reject_records_reviewer_and_notes(ctx: &TestHarness) {
    let extraction = extraction_for(&ctx.db_pool, "reject-me", sparse_payload("Royal Wulff"))
        .await
        .unwrap();

    let rejected = reject_extraction(extraction.id, REVIEWER, "  not a pattern page ", &ctx.db_pool)
        .await
        .unwrap();

    assert_eq!(rejected.status().unwrap(), ExtractionStatus::Rejected);
    assert_eq!(rejected.reviewed_by.as_deref(), Some(REVIEWER));
    assert_eq!(rejected.review_notes.as_deref(), Some("not a pattern page"));
    assert!(rejected.reviewed_at.is_some());
}

#[test_context(TestHarness)]
#[tokio::test]
async fn reject_requires_notes(ctx: &TestHarness) {
    let extraction = extraction_for(&ctx.db_pool, "no-notes", sparse_payload("Royal Wulff"))
        .await
        .unwrap();

    let err = reject_extraction(extraction.id, REVIEWER, "  ", &ctx.db_pool)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));

    let stored = Extraction::find_by_id(extraction.id, &ctx.db_pool).await.unwrap();
    assert_eq!(stored.status().unwrap(), ExtractionStatus::Extracted);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn approval_validation_failure_leaves_status_unchanged(ctx: &TestHarness) {
    let no_materials = ExtractedPayload {
        name: Some("Stimulator".to_string()),
        ..Default::default()
    };
    let extraction = extraction_for(&ctx.db_pool, "stimulator", no_materials).await.unwrap();

    let err = approve_extraction(extraction.id, REVIEWER, None, &ctx.db_pool)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)), "got {:?}", err);

    let stored = Extraction::find_by_id(extraction.id, &ctx.db_pool).await.unwrap();
    assert_eq!(stored.status().unwrap(), ExtractionStatus::Extracted);
    assert!(stored.reviewed_by.is_none());
    assert_eq!(CanonicalPattern::count(&ctx.db_pool).await.unwrap(), 0);
}

#[test_context(TestHarness)]
#[tokio::test]
async fn approve_requires_reviewer(ctx: &TestHarness) {
    let extraction = extraction_for(&ctx.db_pool, "anon", complete_payload("Muddler Minnow"))
        .await
        .unwrap();

    let err = approve_extraction(extraction.id, " ", None, &ctx.db_pool)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Validation(_)));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn deciding_twice_is_a_conflict(ctx: &TestHarness) {
    let extraction = extraction_for(&ctx.db_pool, "twice", complete_payload("Prince Nymph"))
        .await
        .unwrap();
    approve_extraction(extraction.id, REVIEWER, Some("looks right"), &ctx.db_pool)
        .await
        .unwrap();

    let err = approve_extraction(extraction.id, REVIEWER, None, &ctx.db_pool)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Conflict(_)));

    let err = reject_extraction(extraction.id, REVIEWER, "changed my mind", &ctx.db_pool)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::Conflict(_)));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn unknown_extraction_is_not_found(ctx: &TestHarness) {
    let missing = flybox_core::common::ExtractionId::new();
    let err = approve_extraction(missing, REVIEWER, None, &ctx.db_pool)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NotFound { .. }));

    let err = reject_extraction(missing, REVIEWER, "gone", &ctx.db_pool)
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::NotFound { .. }));
}

#[test_context(TestHarness)]
#[tokio::test]
async fn concurrent_decisions_have_exactly_one_winner(ctx: &TestHarness) {
    let extraction = extraction_for(&ctx.db_pool, "race", complete_payload("Pheasant Tail"))
        .await
        .unwrap();

    let (approve, reject) = tokio::join!(
        approve_extraction(extraction.id, "alice", None, &ctx.db_pool),
        reject_extraction(extraction.id, "bob", "not convinced", &ctx.db_pool),
    );

    let winners = [approve.is_ok(), reject.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(
        winners,
        1,
        "approve: {:?}, reject: {:?}",
        approve.as_ref().err(),
        reject.as_ref().err()
    );

    let loser = if approve.is_ok() { reject.unwrap_err() } else { approve.unwrap_err() };
    assert!(matches!(loser, PipelineError::Conflict(_)), "got {:?}", loser);

    let stored = Extraction::find_by_id(extraction.id, &ctx.db_pool).await.unwrap();
    let patterns = CanonicalPattern::count(&ctx.db_pool).await.unwrap();
    match stored.status().unwrap() {
        ExtractionStatus::Ingested => assert_eq!(patterns, 1),
        ExtractionStatus::Rejected => assert_eq!(patterns, 0),
        other => panic!("unexpected final status {}", other),
    }
}

#[test_context(TestHarness)]
#[tokio::test]
async fn concurrent_approvals_ingest_once(ctx: &TestHarness) {
    let extraction = extraction_for(&ctx.db_pool, "double-approve", complete_payload("Zug Bug"))
        .await
        .unwrap();

    let id = extraction.id;
    let results = futures::future::join_all((0..4).map(|i| {
        let pool = ctx.db_pool.clone();
        async move { approve_extraction(id, &format!("reviewer-{}", i), None, &pool).await }
    }))
    .await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    assert!(results
        .iter()
        .filter_map(|r| r.as_ref().err())
        .all(|e| matches!(e, PipelineError::Conflict(_))));
    assert_eq!(CanonicalPattern::count_by_identity_key("zug-bug", &ctx.db_pool).await.unwrap(), 1);
}
