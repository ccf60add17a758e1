use crate::entropy::{self, DEFAULT_DECAY_WINDOWS};
use crate::graph::ReferenceGraph;
use crate::model::{AggregateResult, CollectionFailure, CollectionResult};
use chrono::{DateTime, Utc};
use pagerot_client::{CollectionSnapshot, PageRecord};
use tracing::debug;
use uuid::Uuid;

/// Compute one collection's result from its snapshot and graph.
pub fn collection_result(
    snapshot: &CollectionSnapshot,
    graph: &ReferenceGraph,
    threshold_days: i64,
    as_of: DateTime<Utc>,
) -> CollectionResult {
    let decay = entropy::time_decay_ratio(&snapshot.pages, threshold_days, as_of);
    let breakage = entropy::link_breakage_ratio(&snapshot.pages, graph);

    CollectionResult {
        collection_id: snapshot.collection_id.clone(),
        total_pages: snapshot.pages.len(),
        stale_count: decay.stale_count,
        stale_ratio: decay.stale_ratio,
        stale_page_ids: decay.stale_page_ids,
        isolated_count: breakage.isolated_count,
        isolated_ratio: breakage.isolated_ratio,
        isolated_page_ids: breakage.isolated_page_ids,
        dangling_refs: graph.dangling_total(),
        skipped_records: snapshot.skipped_records,
        decay_profile: entropy::decay_profile(&snapshot.pages, &DEFAULT_DECAY_WINDOWS, as_of),
    }
}

/// Merge per-collection audits into the run result.
///
/// Overall ratios are pooled sums across collections
/// (`sum(stale_count) / sum(total_pages)`), never means of per-collection
/// ratios. Zero-page collections stay in the breakdown with `0.0` ratios:
/// "checked but empty" and "never checked" must stay distinguishable.
pub fn aggregate(
    per_collection: &[(CollectionSnapshot, ReferenceGraph)],
    failures: Vec<CollectionFailure>,
    threshold_days: i64,
    as_of: DateTime<Utc>,
) -> AggregateResult {
    let collections: Vec<CollectionResult> = per_collection
        .iter()
        .map(|(snapshot, graph)| collection_result(snapshot, graph, threshold_days, as_of))
        .collect();

    let total_pages: usize = collections.iter().map(|c| c.total_pages).sum();
    let stale_count: usize = collections.iter().map(|c| c.stale_count).sum();
    let isolated_count: usize = collections.iter().map(|c| c.isolated_count).sum();
    let stale_ratio = entropy::ratio(stale_count, total_pages);
    let isolated_ratio = entropy::ratio(isolated_count, total_pages);

    let all_pages: Vec<PageRecord> = per_collection
        .iter()
        .flat_map(|(snapshot, _)| snapshot.pages.iter().cloned())
        .collect();
    let decay_profile = entropy::decay_profile(&all_pages, &DEFAULT_DECAY_WINDOWS, as_of);
    let activity = entropy::activity_metrics(&all_pages, as_of);
    let health = entropy::health_score(stale_ratio, activity.rate_30d, isolated_ratio);

    debug!(
        "aggregated {} collections ({} failed), {} pages",
        collections.len(),
        failures.len(),
        total_pages
    );

    AggregateResult {
        run_id: Uuid::new_v4().to_string(),
        as_of,
        threshold_days,
        collections,
        failures,
        total_pages,
        stale_count,
        stale_ratio,
        isolated_count,
        isolated_ratio,
        decay_profile,
        activity,
        health,
    }
}
