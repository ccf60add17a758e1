use crate::entropy::{ActivityMetrics, DecayWindow, HealthScore};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// One collection's audit outcome. Ratios are fractions in `[0, 1]`; id
/// lists keep the original fetch order.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionResult {
    pub collection_id: String,
    pub total_pages: usize,
    pub stale_count: usize,
    pub stale_ratio: f64,
    pub stale_page_ids: Vec<String>,
    pub isolated_count: usize,
    pub isolated_ratio: f64,
    pub isolated_page_ids: Vec<String>,
    /// References pointing outside the fetched snapshot.
    pub dangling_refs: usize,
    /// Malformed records dropped during the fetch.
    pub skipped_records: usize,
    pub decay_profile: Vec<DecayWindow>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FailureKind {
    AccessDenied,
    FetchExhausted,
    InvalidId,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::AccessDenied => "access_denied",
            FailureKind::FetchExhausted => "fetch_exhausted",
            FailureKind::InvalidId => "invalid_id",
        }
    }
}

/// A collection the run could not audit. Sibling collections are never
/// affected; failures ride along in the aggregate next to the successes.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionFailure {
    pub collection_id: String,
    pub kind: FailureKind,
    pub detail: String,
}

/// Whole-run outcome: per-collection breakdown plus pooled totals.
/// Constructed once per run, read-only thereafter.
#[derive(Debug, Clone, Serialize)]
pub struct AggregateResult {
    pub run_id: String,
    pub as_of: DateTime<Utc>,
    pub threshold_days: i64,
    pub collections: Vec<CollectionResult>,
    pub failures: Vec<CollectionFailure>,
    pub total_pages: usize,
    pub stale_count: usize,
    pub stale_ratio: f64,
    pub isolated_count: usize,
    pub isolated_ratio: f64,
    pub decay_profile: Vec<DecayWindow>,
    pub activity: ActivityMetrics,
    pub health: HealthScore,
}
