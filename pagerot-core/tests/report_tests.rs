// Tests for Markdown report rendering

use chrono::{DateTime, Duration, TimeZone, Utc};
use pagerot_client::{CollectionSnapshot, PageRecord};
use pagerot_core::aggregate::aggregate;
use pagerot_core::graph::{ReferenceGraph, build_graph};
use pagerot_core::model::{CollectionFailure, FailureKind};
use pagerot_core::report::render_markdown;

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

#[test]
fn report_carries_the_headline_numbers() {
    let result = aggregate(
        &[snapshot(
            "col-1",
            vec![
                page("fresh", 1, &["old"]),
                page("old", 40, &[]),
            ],
        )],
        Vec::new(),
        30,
        as_of(),
    );
    let report = render_markdown(&result);

    assert!(report.contains("# Knowledge base decay report"));
    assert!(report.contains("**As of**: 2026-03-01 12:00:00 UTC"));
    assert!(report.contains("**Staleness threshold**: 30 days"));
    assert!(report.contains("| Pages | 2 |"));
    assert!(report.contains("| Stale pages (> 30 days) | 1 (50.0%) |"));
    assert!(report.contains("### `col-1`"));
    assert!(report.contains("| > 30 days | 1 | 50.0% |"));
}

#[test]
fn failures_get_their_own_section() {
    let failure = CollectionFailure {
        collection_id: "locked".to_string(),
        kind: FailureKind::AccessDenied,
        detail: "access denied for locked".to_string(),
    };
    let result = aggregate(&[], vec![failure], 30, as_of());
    let report = render_markdown(&result);

    assert!(report.contains("## Failed collections"));
    assert!(report.contains("| `locked` | access_denied |"));
    assert!(report.contains("Grant the integration access"));
}

#[test]
fn long_page_lists_are_truncated() {
    let pages: Vec<PageRecord> = (0..25).map(|i| page(&format!("p{}", i), 400, &[])).collect();
    let result = aggregate(&[snapshot("big", pages)], Vec::new(), 30, as_of());
    let report = render_markdown(&result);

    assert!(report.contains("(showing first 15 of 25)"));
    assert!(report.contains("(showing first 20 of 25)"));
    assert!(report.contains("- `p14`\n"));
    assert!(!report.contains("- `p24`\n"));
}

#[test]
fn healthy_workspace_needs_no_action() {
    let result = aggregate(
        &[snapshot(
            "tidy",
            vec![page("a", 1, &["b"]), page("b", 2, &["a"])],
        )],
        Vec::new(),
        30,
        as_of(),
    );
    let report = render_markdown(&result);

    assert!(report.contains("- No action needed"));
    assert!(!report.contains("## Failed collections"));
}

#[test]
fn rotten_workspace_collects_every_recommendation() {
    let failure = CollectionFailure {
        collection_id: "locked".to_string(),
        kind: FailureKind::FetchExhausted,
        detail: "retry budget exhausted after 4 attempts".to_string(),
    };
    let result = aggregate(
        &[snapshot(
            "stale",
            vec![page("a", 400, &[]), page("b", 400, &[])],
        )],
        vec![failure],
        30,
        as_of(),
    );
    let report = render_markdown(&result);

    assert!(report.contains("- Review content untouched for more than 30 days"));
    assert!(report.contains("- Link isolated pages"));
    assert!(report.contains("- Grant the integration access"));
    assert!(!report.contains("No action needed"));
}
