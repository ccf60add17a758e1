use crate::graph::ReferenceGraph;
use chrono::{DateTime, Duration, Utc};
use pagerot_client::PageRecord;
use serde::Serialize;

/// Default windows for the multi-window decay profile, in days.
pub const DEFAULT_DECAY_WINDOWS: [i64; 4] = [30, 90, 150, 300];

pub(crate) fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DecayMetric {
    pub total_pages: usize,
    pub stale_count: usize,
    pub stale_ratio: f64,
    /// Offending pages in original fetch order.
    pub stale_page_ids: Vec<String>,
}

/// Fraction of pages whose last modification lies strictly more than
/// `threshold_days` before `as_of`. A page modified exactly on the boundary
/// is not stale; one second past it is. An empty input yields `0.0`, never
/// NaN.
pub fn time_decay_ratio(
    pages: &[PageRecord],
    threshold_days: i64,
    as_of: DateTime<Utc>,
) -> DecayMetric {
    let threshold = Duration::days(threshold_days);
    let stale_page_ids: Vec<String> = pages
        .iter()
        .filter(|page| as_of.signed_duration_since(page.last_modified_at) > threshold)
        .map(|page| page.id.clone())
        .collect();

    let total_pages = pages.len();
    let stale_count = stale_page_ids.len();
    DecayMetric {
        total_pages,
        stale_count,
        stale_ratio: ratio(stale_count, total_pages),
        stale_page_ids,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BreakageMetric {
    pub total_pages: usize,
    pub isolated_count: usize,
    pub isolated_ratio: f64,
    /// Offending pages in original fetch order.
    pub isolated_page_ids: Vec<String>,
}

/// Fraction of pages no other page references. Self-references and dangling
/// references never rescue a page from isolation. Empty input yields `0.0`.
pub fn link_breakage_ratio(pages: &[PageRecord], graph: &ReferenceGraph) -> BreakageMetric {
    let isolated_page_ids: Vec<String> = pages
        .iter()
        .filter(|page| graph.is_isolated(&page.id))
        .map(|page| page.id.clone())
        .collect();

    let total_pages = pages.len();
    let isolated_count = isolated_page_ids.len();
    BreakageMetric {
        total_pages,
        isolated_count,
        isolated_ratio: ratio(isolated_count, total_pages),
        isolated_page_ids,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DecayWindow {
    pub threshold_days: i64,
    pub stale_count: usize,
    pub stale_ratio: f64,
}

/// Decay measured against several widening windows at once.
pub fn decay_profile(
    pages: &[PageRecord],
    thresholds: &[i64],
    as_of: DateTime<Utc>,
) -> Vec<DecayWindow> {
    thresholds
        .iter()
        .map(|&threshold_days| {
            let metric = time_decay_ratio(pages, threshold_days, as_of);
            DecayWindow {
                threshold_days,
                stale_count: metric.stale_count,
                stale_ratio: metric.stale_ratio,
            }
        })
        .collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityMetrics {
    pub total_pages: usize,
    pub active_7d: usize,
    pub active_30d: usize,
    pub active_90d: usize,
    pub rate_7d: f64,
    pub rate_30d: f64,
    pub rate_90d: f64,
}

/// Pages touched within the trailing 7/30/90 days. The bound is inclusive:
/// a page modified exactly 30 days ago still counts as active for 30d.
pub fn activity_metrics(pages: &[PageRecord], as_of: DateTime<Utc>) -> ActivityMetrics {
    let mut active_7d = 0;
    let mut active_30d = 0;
    let mut active_90d = 0;
    for page in pages {
        let age = as_of.signed_duration_since(page.last_modified_at);
        if age <= Duration::days(7) {
            active_7d += 1;
        }
        if age <= Duration::days(30) {
            active_30d += 1;
        }
        if age <= Duration::days(90) {
            active_90d += 1;
        }
    }

    let total_pages = pages.len();
    ActivityMetrics {
        total_pages,
        active_7d,
        active_30d,
        active_90d,
        rate_7d: ratio(active_7d, total_pages),
        rate_30d: ratio(active_30d, total_pages),
        rate_90d: ratio(active_90d, total_pages),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthGrade {
    A,
    B,
    C,
    D,
}

impl HealthGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthGrade::A => "A",
            HealthGrade::B => "B",
            HealthGrade::C => "C",
            HealthGrade::D => "D",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthScore {
    /// Weighted score in `[0, 1]`.
    pub score: f64,
    pub grade: HealthGrade,
    pub freshness: f64,
    pub activity: f64,
    pub connectivity: f64,
}

/// Weighted workspace grade over freshness, activity and connectivity.
/// A 50% 30-day activity rate already earns full activity marks.
pub fn health_score(
    stale_ratio: f64,
    activity_rate_30d: f64,
    isolated_ratio: f64,
) -> HealthScore {
    let freshness = (1.0 - stale_ratio).clamp(0.0, 1.0);
    let activity = (activity_rate_30d * 2.0).clamp(0.0, 1.0);
    let connectivity = (1.0 - isolated_ratio).clamp(0.0, 1.0);
    let score = freshness * 0.40 + activity * 0.35 + connectivity * 0.25;

    let grade = if score >= 0.8 {
        HealthGrade::A
    } else if score >= 0.6 {
        HealthGrade::B
    } else if score >= 0.4 {
        HealthGrade::C
    } else {
        HealthGrade::D
    };

    HealthScore {
        score,
        grade,
        freshness,
        activity,
        connectivity,
    }
}
