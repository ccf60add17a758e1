use crate::cancel::CancelToken;
use crate::client::{PageBatch, RequestError, WorkspaceClient};
use crate::error::{ErrorKind, FetchError, Result};
use crate::limit::RateLimiter;
use crate::record::{CollectionSnapshot, PageRecord};
use crate::retry::RetryPolicy;
use futures::Stream;
use futures::stream;
use serde_json::Value;
use std::collections::VecDeque;
use std::future::Future;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Normalize a collection id the way the source API prints them: a bare
/// 32-hex-digit id is re-hyphenated 8-4-4-4-12, an already well-formed id
/// passes through.
pub fn normalize_collection_id(raw: &str) -> Result<String> {
    let trimmed = raw.trim();
    let cleaned: String = trimmed.chars().filter(|c| *c != '-').collect();
    if cleaned.len() == 32 && cleaned.chars().all(|c| c.is_ascii_hexdigit()) {
        return Ok(format!(
            "{}-{}-{}-{}-{}",
            &cleaned[0..8],
            &cleaned[8..12],
            &cleaned[12..16],
            &cleaned[16..20],
            &cleaned[20..32]
        ));
    }
    if trimmed.is_empty()
        || !trimmed.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(FetchError::InvalidCollectionId(raw.to_string()));
    }
    Ok(trimmed.to_string())
}

/// Run one request under the shared rate limiter and the retry policy.
/// Every attempt takes a limiter token; cancellation is checked before each
/// attempt and again before each backoff sleep.
async fn request_with_retry<F, Fut>(
    limiter: &RateLimiter,
    policy: &RetryPolicy,
    cancel: &CancelToken,
    target: &str,
    mut request: F,
) -> Result<PageBatch>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<PageBatch, RequestError>>,
{
    let mut attempt = 0u32;
    loop {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        limiter.acquire().await;
        attempt += 1;

        let err = match request().await {
            Ok(batch) => return Ok(batch),
            Err(err) => err,
        };

        let kind = err.kind();
        if kind == ErrorKind::Denied {
            return Err(FetchError::AccessDenied(target.to_string()));
        }
        match policy.decide(attempt, kind) {
            Some(delay) => {
                // A server-provided hint wins over the computed backoff,
                // still capped by the policy ceiling.
                let delay = err.retry_after().unwrap_or(delay).min(policy.max_delay);
                warn!(
                    "request for {} failed (attempt {}): {}; retrying in {:?}",
                    target, attempt, err, delay
                );
                if cancel.is_cancelled() {
                    return Err(FetchError::Cancelled);
                }
                sleep(delay).await;
            }
            None => {
                return Err(match kind {
                    ErrorKind::Malformed => FetchError::Malformed(err.to_string()),
                    _ => FetchError::Exhausted {
                        attempts: attempt,
                        cause: err.to_string(),
                    },
                });
            }
        }
    }
}

/// Parse a batch of raw records into `pages`, returning how many malformed
/// records were skipped. One bad record never fails the batch.
fn parse_batch(collection_id: &str, values: &[Value], pages: &mut Vec<PageRecord>) -> usize {
    let mut skipped = 0;
    for value in values {
        match PageRecord::from_value(value) {
            Ok(mut record) => {
                if record.collection_id.is_none() {
                    record.collection_id = Some(collection_id.to_string());
                }
                pages.push(record);
            }
            Err(err) => {
                warn!("skipping malformed record in {}: {}", collection_id, err);
                skipped += 1;
            }
        }
    }
    skipped
}

struct StreamState {
    id: Result<String>,
    cursor: Option<String>,
    buffered: VecDeque<PageRecord>,
    done: bool,
}

/// Fetch every page of a collection as a lazy stream in retrieval order.
/// Each call restarts the retrieval from the first page; continuation
/// cursors never escape this function.
pub fn fetch_collection<'a>(
    client: &'a WorkspaceClient,
    limiter: &'a RateLimiter,
    policy: &'a RetryPolicy,
    cancel: &'a CancelToken,
    collection_id: &str,
) -> impl Stream<Item = Result<PageRecord>> + 'a {
    let state = StreamState {
        id: normalize_collection_id(collection_id),
        cursor: None,
        buffered: VecDeque::new(),
        done: false,
    };

    stream::try_unfold(state, move |mut state| async move {
        loop {
            if let Some(record) = state.buffered.pop_front() {
                return Ok(Some((record, state)));
            }
            if state.done {
                return Ok(None);
            }
            if cancel.is_cancelled() {
                return Err(FetchError::Cancelled);
            }

            let id = match &state.id {
                Ok(id) => id.clone(),
                Err(err) => return Err(err.clone()),
            };
            let batch = request_with_retry(limiter, policy, cancel, &id, || {
                client.query_page(&id, state.cursor.as_deref())
            })
            .await?;

            let mut fetched = Vec::new();
            parse_batch(&id, &batch.results, &mut fetched);
            debug!("collection {}: batch of {} records", id, fetched.len());
            state.buffered.extend(fetched);
            // A server claiming more results without a cursor would loop us
            // on the first page forever.
            state.done = !(batch.has_more && batch.next_cursor.is_some());
            state.cursor = batch.next_cursor;
        }
    })
}

/// Eager variant of [`fetch_collection`]: drain the whole collection into a
/// snapshot, tallying the malformed records that were skipped.
pub async fn collect_collection(
    client: &WorkspaceClient,
    limiter: &RateLimiter,
    policy: &RetryPolicy,
    cancel: &CancelToken,
    collection_id: &str,
) -> Result<CollectionSnapshot> {
    let id = normalize_collection_id(collection_id)?;
    info!("fetching collection {}", id);

    let mut pages = Vec::new();
    let mut skipped = 0usize;
    let mut cursor: Option<String> = None;
    loop {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let batch = request_with_retry(limiter, policy, cancel, &id, || {
            client.query_page(&id, cursor.as_deref())
        })
        .await?;
        skipped += parse_batch(&id, &batch.results, &mut pages);
        if !(batch.has_more && batch.next_cursor.is_some()) {
            break;
        }
        cursor = batch.next_cursor;
    }

    info!("collection {}: {} pages ({} skipped)", id, pages.len(), skipped);
    Ok(CollectionSnapshot {
        collection_id: id,
        pages,
        skipped_records: skipped,
    })
}

/// Discover every collection visible to the integration, paginating the
/// search endpoint under the same retry machinery.
pub async fn list_collections(
    client: &WorkspaceClient,
    limiter: &RateLimiter,
    policy: &RetryPolicy,
    cancel: &CancelToken,
) -> Result<Vec<String>> {
    let mut ids: Vec<String> = Vec::new();
    let mut cursor: Option<String> = None;
    loop {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let batch = request_with_retry(limiter, policy, cancel, "search", || {
            client.search_collections(cursor.as_deref())
        })
        .await?;
        for value in &batch.results {
            if let Some(id) = value.get("id").and_then(Value::as_str)
                && !ids.iter().any(|seen| seen == id)
            {
                ids.push(id.to_string());
            }
        }
        if !(batch.has_more && batch.next_cursor.is_some()) {
            break;
        }
        cursor = batch.next_cursor;
    }

    info!("discovered {} collections", ids.len());
    Ok(ids)
}
