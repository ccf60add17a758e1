// Markdown rendering for audit results; writing the string anywhere is the
// caller's business.

use crate::model::{AggregateResult, CollectionResult};

const MAX_STALE_ROWS: usize = 15;
const MAX_ISOLATED_ROWS: usize = 20;

fn percent(ratio: f64) -> String {
    format!("{:.1}%", ratio * 100.0)
}

fn decay_status(ratio: f64) -> &'static str {
    if ratio > 0.8 {
        "severe"
    } else if ratio > 0.5 {
        "warning"
    } else if ratio > 0.3 {
        "attention"
    } else {
        "normal"
    }
}

/// Render the run result as a Markdown document.
pub fn render_markdown(result: &AggregateResult) -> String {
    let mut report = String::new();

    report.push_str("# Knowledge base decay report\n\n");
    report.push_str(&format!("**Run**: `{}`  \n", result.run_id));
    report.push_str(&format!(
        "**As of**: {}  \n",
        result.as_of.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    report.push_str(&format!(
        "**Staleness threshold**: {} days\n\n",
        result.threshold_days
    ));

    report.push_str("## Overview\n\n");
    report.push_str("| Metric | Value |\n");
    report.push_str("|--------|-------|\n");
    report.push_str(&format!(
        "| Health | {:.0}/100 (grade {}) |\n",
        result.health.score * 100.0,
        result.health.grade.as_str()
    ));
    report.push_str(&format!("| Pages | {} |\n", result.total_pages));
    report.push_str(&format!(
        "| Collections audited | {} |\n",
        result.collections.len()
    ));
    report.push_str(&format!(
        "| Collections failed | {} |\n",
        result.failures.len()
    ));
    report.push_str(&format!(
        "| Stale pages (> {} days) | {} ({}) |\n",
        result.threshold_days,
        result.stale_count,
        percent(result.stale_ratio)
    ));
    report.push_str(&format!(
        "| Isolated pages | {} ({}) |\n",
        result.isolated_count,
        percent(result.isolated_ratio)
    ));
    report.push('\n');

    report.push_str("## Decay profile\n\n");
    report.push_str("| Not modified in | Pages | Share | Status |\n");
    report.push_str("|----------------|-------|-------|--------|\n");
    for window in &result.decay_profile {
        report.push_str(&format!(
            "| > {} days | {} | {} | {} |\n",
            window.threshold_days,
            window.stale_count,
            percent(window.stale_ratio),
            decay_status(window.stale_ratio)
        ));
    }
    report.push('\n');

    report.push_str("## Activity\n\n");
    report.push_str("| Window | Active pages | Rate |\n");
    report.push_str("|--------|--------------|------|\n");
    report.push_str(&format!(
        "| 7 days | {} | {} |\n",
        result.activity.active_7d,
        percent(result.activity.rate_7d)
    ));
    report.push_str(&format!(
        "| 30 days | {} | {} |\n",
        result.activity.active_30d,
        percent(result.activity.rate_30d)
    ));
    report.push_str(&format!(
        "| 90 days | {} | {} |\n",
        result.activity.active_90d,
        percent(result.activity.rate_90d)
    ));
    report.push('\n');

    report.push_str("## Collections\n\n");
    for collection in &result.collections {
        render_collection(&mut report, collection);
    }

    if !result.failures.is_empty() {
        report.push_str("## Failed collections\n\n");
        report.push_str("| Collection | Failure | Detail |\n");
        report.push_str("|------------|---------|--------|\n");
        for failure in &result.failures {
            report.push_str(&format!(
                "| `{}` | {} | {} |\n",
                failure.collection_id,
                failure.kind.as_str(),
                failure.detail
            ));
        }
        report.push('\n');
    }

    report.push_str("## Recommendations\n\n");
    let mut advised = false;
    if result.stale_ratio > 0.4 {
        report.push_str(&format!(
            "- Review content untouched for more than {} days; archive or delete what no longer matters.\n",
            result.threshold_days
        ));
        advised = true;
    }
    if result.isolated_ratio > 0.3 {
        report.push_str(
            "- Link isolated pages from related content so they stay reachable.\n",
        );
        advised = true;
    }
    if !result.failures.is_empty() {
        report.push_str(
            "- Grant the integration access to the failed collections, or drop them from the target list.\n",
        );
        advised = true;
    }
    if !advised {
        report.push_str("- No action needed; the workspace is in good shape.\n");
    }

    report
}

fn render_collection(report: &mut String, collection: &CollectionResult) {
    report.push_str(&format!("### `{}`\n\n", collection.collection_id));
    report.push_str(&format!("- Pages: {}\n", collection.total_pages));
    report.push_str(&format!(
        "- Stale: {} ({})\n",
        collection.stale_count,
        percent(collection.stale_ratio)
    ));
    report.push_str(&format!(
        "- Isolated: {} ({})\n",
        collection.isolated_count,
        percent(collection.isolated_ratio)
    ));
    if collection.dangling_refs > 0 {
        report.push_str(&format!(
            "- Dangling references: {}\n",
            collection.dangling_refs
        ));
    }
    if collection.skipped_records > 0 {
        report.push_str(&format!(
            "- Skipped malformed records: {}\n",
            collection.skipped_records
        ));
    }
    report.push('\n');

    if !collection.stale_page_ids.is_empty() {
        report.push_str("Stale pages:\n\n");
        for id in collection.stale_page_ids.iter().take(MAX_STALE_ROWS) {
            report.push_str(&format!("- `{}`\n", id));
        }
        if collection.stale_page_ids.len() > MAX_STALE_ROWS {
            report.push_str(&format!(
                "- (showing first {} of {})\n",
                MAX_STALE_ROWS,
                collection.stale_page_ids.len()
            ));
        }
        report.push('\n');
    }

    if !collection.isolated_page_ids.is_empty() {
        report.push_str("Isolated pages:\n\n");
        for id in collection.isolated_page_ids.iter().take(MAX_ISOLATED_ROWS) {
            report.push_str(&format!("- `{}`\n", id));
        }
        if collection.isolated_page_ids.len() > MAX_ISOLATED_ROWS {
            report.push_str(&format!(
                "- (showing first {} of {})\n",
                MAX_ISOLATED_ROWS,
                collection.isolated_page_ids.len()
            ));
        }
        report.push('\n');
    }
}
