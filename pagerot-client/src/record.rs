use crate::error::{FetchError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One page/record from the source workspace.
///
/// Snapshot value: immutable once parsed. Re-fetching a collection builds
/// new records, it never mutates old ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageRecord {
    pub id: String,
    /// Owning collection; `None` for unfiled pages.
    pub collection_id: Option<String>,
    /// Display title, kept for reporting only.
    pub title: Option<String>,
    pub last_modified_at: DateTime<Utc>,
    /// Declared relation targets, in declared order. Duplicates and
    /// self-references are preserved; targets may not exist in the snapshot.
    pub outgoing_refs: Vec<String>,
}

impl PageRecord {
    /// Parse one raw API object. A record without an id or a parseable
    /// modification timestamp is malformed; everything else is optional.
    pub fn from_value(value: &Value) -> Result<Self> {
        let id = value
            .get("id")
            .and_then(Value::as_str)
            .ok_or_else(|| FetchError::Malformed("record without id".to_string()))?
            .to_string();

        let raw_ts = value
            .get("last_edited_time")
            .and_then(Value::as_str)
            .ok_or_else(|| {
                FetchError::Malformed(format!("record {} without last_edited_time", id))
            })?;
        let last_modified_at = DateTime::parse_from_rfc3339(raw_ts)
            .map_err(|e| FetchError::Malformed(format!("record {}: bad timestamp {}: {}", id, raw_ts, e)))?
            .with_timezone(&Utc);

        let collection_id = value
            .get("parent")
            .filter(|p| p.get("type").and_then(Value::as_str) == Some("collection_id"))
            .and_then(|p| p.get("collection_id"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let mut title = None;
        let mut outgoing_refs = Vec::new();
        if let Some(properties) = value.get("properties").and_then(Value::as_object) {
            for prop in properties.values() {
                match prop.get("type").and_then(Value::as_str) {
                    Some("relation") => {
                        if let Some(relations) = prop.get("relation").and_then(Value::as_array) {
                            for relation in relations {
                                if let Some(target) = relation.get("id").and_then(Value::as_str) {
                                    outgoing_refs.push(target.to_string());
                                }
                            }
                        }
                    }
                    Some("title") => {
                        if let Some(fragments) = prop.get("title").and_then(Value::as_array) {
                            let text: String = fragments
                                .iter()
                                .filter_map(|f| f.get("plain_text").and_then(Value::as_str))
                                .collect();
                            if !text.is_empty() {
                                title = Some(text);
                            }
                        }
                    }
                    _ => {}
                }
            }
        }

        Ok(Self {
            id,
            collection_id,
            title,
            last_modified_at,
            outgoing_refs,
        })
    }
}

/// Everything fetched for one collection in one run, in retrieval order.
#[derive(Debug, Clone, Serialize)]
pub struct CollectionSnapshot {
    pub collection_id: String,
    pub pages: Vec<PageRecord>,
    /// Malformed records dropped during the fetch.
    pub skipped_records: usize,
}
