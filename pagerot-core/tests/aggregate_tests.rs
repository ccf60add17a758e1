// Tests for result aggregation

use chrono::{DateTime, Duration, TimeZone, Utc};
use pagerot_client::{CollectionSnapshot, PageRecord};
use pagerot_core::aggregate::{aggregate, collection_result};
use pagerot_core::graph::{ReferenceGraph, build_graph};
use pagerot_core::model::{CollectionFailure, FailureKind};

fn as_of() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn page(id: &str, days_old: i64, refs: &[&str]) -> PageRecord {
    PageRecord {
        id: id.to_string(),
        collection_id: None,
        title: None,
        last_modified_at: as_of() - Duration::days(days_old),
        outgoing_refs: refs.iter().map(|r| r.to_string()).collect(),
    }
}

fn snapshot(id: &str, pages: Vec<PageRecord>) -> (CollectionSnapshot, ReferenceGraph) {
    let graph = build_graph(&pages);
    (
        CollectionSnapshot {
            collection_id: id.to_string(),
            pages,
            skipped_records: 0,
        },
        graph,
    )
}

// ============================================================================
// Per-collection results
// ============================================================================

#[test]
fn collection_result_carries_both_metrics() {
    let (snap, graph) = snapshot(
        "col-1",
        vec![
            page("a", 40, &["b", "ghost"]),
            page("b", 1, &[]),
            page("c", 40, &[]),
        ],
    );
    let result = collection_result(&snap, &graph, 30, as_of());

    assert_eq!(result.collection_id, "col-1");
    assert_eq!(result.total_pages, 3);
    assert_eq!(result.stale_count, 2);
    assert_eq!(result.stale_page_ids, vec!["a", "c"]);
    assert_eq!(result.isolated_count, 2);
    assert_eq!(result.isolated_page_ids, vec!["a", "c"]);
    assert_eq!(result.dangling_refs, 1);
    assert_eq!(result.decay_profile.len(), 4);
}

#[test]
fn zero_page_collection_reports_zero_ratios() {
    let (snap, graph) = snapshot("empty", Vec::new());
    let result = collection_result(&snap, &graph, 30, as_of());

    assert_eq!(result.total_pages, 0);
    assert_eq!(result.stale_ratio, 0.0);
    assert_eq!(result.isolated_ratio, 0.0);
    assert!(result.stale_ratio.is_finite());
    assert!(result.isolated_ratio.is_finite());
}

// ============================================================================
// Pooling
// ============================================================================

#[test]
fn overall_ratio_is_pooled_not_mean() {
    // Four pages with two stale (0.5) next to one fresh page (0.0): the
    // pooled ratio is 2/5 = 0.4 while the mean of ratios would be 0.25.
    let big = snapshot(
        "big",
        vec![
            page("b1", 40, &[]),
            page("b2", 40, &[]),
            page("b3", 1, &[]),
            page("b4", 1, &[]),
        ],
    );
    let small = snapshot("small", vec![page("s1", 1, &[])]);

    let result = aggregate(&[big, small], Vec::new(), 30, as_of());

    assert_eq!(result.total_pages, 5);
    assert_eq!(result.stale_count, 2);
    assert!((result.stale_ratio - 0.4).abs() < f64::EPSILON);

    let mean: f64 = result
        .collections
        .iter()
        .map(|c| c.stale_ratio)
        .sum::<f64>()
        / result.collections.len() as f64;
    assert!((mean - 0.25).abs() < f64::EPSILON);
    assert!((result.stale_ratio - mean).abs() > 0.1);
}

#[test]
fn isolation_pools_across_collections_without_merging_graphs() {
    // Each collection gets its own graph; a reference from one collection
    // to a page id in another is dangling within its own snapshot.
    let left = snapshot("left", vec![page("l1", 1, &["r1"]), page("l2", 1, &["l1"])]);
    let right = snapshot("right", vec![page("r1", 1, &[])]);

    let result = aggregate(&[left, right], Vec::new(), 30, as_of());

    assert_eq!(result.isolated_count, 2);
    let left_result = &result.collections[0];
    assert_eq!(left_result.dangling_refs, 1);
    assert_eq!(left_result.isolated_page_ids, vec!["l2"]);
}

#[test]
fn empty_collections_stay_in_the_breakdown() {
    let result = aggregate(
        &[
            snapshot("filled", vec![page("a", 1, &[])]),
            snapshot("empty", Vec::new()),
        ],
        Vec::new(),
        30,
        as_of(),
    );

    assert_eq!(result.collections.len(), 2);
    assert_eq!(result.collections[1].collection_id, "empty");
    assert_eq!(result.collections[1].total_pages, 0);
    assert_eq!(result.collections[1].stale_ratio, 0.0);
}

#[test]
fn empty_run_aggregates_to_zeros() {
    let result = aggregate(&[], Vec::new(), 30, as_of());
    assert_eq!(result.total_pages, 0);
    assert_eq!(result.stale_ratio, 0.0);
    assert_eq!(result.isolated_ratio, 0.0);
    assert!(result.collections.is_empty());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn failures_ride_along_with_successes() {
    let failure = CollectionFailure {
        collection_id: "locked".to_string(),
        kind: FailureKind::AccessDenied,
        detail: "access denied for locked".to_string(),
    };
    let result = aggregate(
        &[snapshot("open", vec![page("a", 1, &[])])],
        vec![failure],
        30,
        as_of(),
    );

    assert_eq!(result.collections.len(), 1);
    assert_eq!(result.failures.len(), 1);
    assert_eq!(result.failures[0].kind, FailureKind::AccessDenied);
    // Failed collections contribute nothing to the pooled totals.
    assert_eq!(result.total_pages, 1);
}

// ============================================================================
// Pooled extras
// ============================================================================

#[test]
fn pooled_activity_and_health_cover_all_pages() {
    let result = aggregate(
        &[
            snapshot("a", vec![page("a1", 1, &[]), page("a2", 400, &[])]),
            snapshot("b", vec![page("b1", 10, &[])]),
        ],
        Vec::new(),
        30,
        as_of(),
    );

    assert_eq!(result.activity.total_pages, 3);
    assert_eq!(result.activity.active_30d, 2);
    assert_eq!(result.decay_profile[3].stale_count, 1);
    assert!(result.health.score > 0.0 && result.health.score <= 1.0);
}
