use crate::aggregate;
use crate::graph::{ReferenceGraph, build_graph};
use crate::model::{AggregateResult, CollectionFailure, FailureKind};
use chrono::{DateTime, Utc};
use futures::StreamExt;
use futures::stream;
use pagerot_client::{
    CancelToken, CollectionSnapshot, FetchError, RateLimiter, RetryPolicy, WorkspaceClient,
    collect_collection, list_collections,
};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

/// Tunables for one audit run.
#[derive(Debug, Clone)]
pub struct AuditOptions {
    /// Explicit targets; empty means discover every visible collection.
    pub collection_ids: Vec<String>,
    pub threshold_days: i64,
    pub as_of: DateTime<Utc>,
    /// Bounded worker pool for concurrent collections.
    pub workers: usize,
    /// Global request budget shared by all workers.
    pub requests_per_sec: f64,
    pub burst: u32,
    pub retry: RetryPolicy,
}

impl AuditOptions {
    pub fn new(threshold_days: i64, as_of: DateTime<Utc>) -> Self {
        Self {
            collection_ids: Vec::new(),
            threshold_days,
            as_of,
            workers: 4,
            requests_per_sec: 3.0,
            burst: 3,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_collections(mut self, ids: Vec<String>) -> Self {
        self.collection_ids = ids;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    pub fn with_rate(mut self, requests_per_sec: f64, burst: u32) -> Self {
        self.requests_per_sec = requests_per_sec;
        self.burst = burst;
        self
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
}

#[derive(Error, Debug)]
pub enum AuditError {
    /// No explicit targets and discovery produced nothing.
    #[error("no collections to audit")]
    NoTargets,

    #[error("audit cancelled")]
    Cancelled,
}

/// Audit the given collections end to end and aggregate the outcome.
///
/// Collections are fetched by a bounded worker pool over one shared
/// rate-limit budget; within a collection, pagination stays sequential.
/// A collection that fails with access-denied or an exhausted retry budget
/// is recorded and skipped, never aborting its siblings.
pub async fn run_audit(
    client: &WorkspaceClient,
    options: AuditOptions,
    cancel: &CancelToken,
) -> Result<AggregateResult, AuditError> {
    let limiter = Arc::new(RateLimiter::new(options.requests_per_sec, options.burst));

    let targets = if options.collection_ids.is_empty() {
        match list_collections(client, &limiter, &options.retry, cancel).await {
            Ok(ids) if !ids.is_empty() => ids,
            Ok(_) => {
                warn!("collection discovery returned nothing");
                return Err(AuditError::NoTargets);
            }
            Err(FetchError::Cancelled) => return Err(AuditError::Cancelled),
            Err(err) => {
                warn!("collection discovery failed: {}", err);
                return Err(AuditError::NoTargets);
            }
        }
    } else {
        options.collection_ids.clone()
    };

    info!(
        "auditing {} collections as of {} (threshold {} days)",
        targets.len(),
        options.as_of,
        options.threshold_days
    );

    let retry = &options.retry;
    let mut outcomes: Vec<(
        usize,
        Result<(CollectionSnapshot, ReferenceGraph), CollectionFailure>,
    )> = stream::iter(targets.into_iter().enumerate())
        .map(|(index, id)| {
            let limiter = limiter.clone();
            async move {
                let outcome = match collect_collection(client, &limiter, retry, cancel, &id).await
                {
                    Ok(snapshot) => {
                        let graph = build_graph(&snapshot.pages);
                        Ok((snapshot, graph))
                    }
                    Err(err) => Err(classify_failure(&id, err)),
                };
                (index, outcome)
            }
        })
        .buffer_unordered(options.workers.max(1))
        .collect()
        .await;

    if cancel.is_cancelled() {
        return Err(AuditError::Cancelled);
    }

    // Workers finish in arbitrary order; reporting follows request order.
    outcomes.sort_by_key(|(index, _)| *index);

    let mut per_collection = Vec::new();
    let mut failures = Vec::new();
    for (_, outcome) in outcomes {
        match outcome {
            Ok(pair) => per_collection.push(pair),
            Err(failure) => {
                warn!(
                    "collection {} failed: {} ({})",
                    failure.collection_id,
                    failure.kind.as_str(),
                    failure.detail
                );
                failures.push(failure);
            }
        }
    }

    Ok(aggregate::aggregate(
        &per_collection,
        failures,
        options.threshold_days,
        options.as_of,
    ))
}

fn classify_failure(collection_id: &str, err: FetchError) -> CollectionFailure {
    let kind = match err {
        FetchError::AccessDenied(_) => FailureKind::AccessDenied,
        FetchError::InvalidCollectionId(_) => FailureKind::InvalidId,
        _ => FailureKind::FetchExhausted,
    };
    CollectionFailure {
        collection_id: collection_id.to_string(),
        kind,
        detail: err.to_string(),
    }
}
