//! Records API for one base (app token).
//!
//! Pagination and batch chunking live here so callers see whole tables
//! and whole batches. Chunks are atomic per call but not across calls:
//! a failed chunk lands in the [`BatchReport`] instead of aborting the
//! remaining chunks.

use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{debug, warn};

use baseops_core::{
    BaseopsError, BatchChunkError, BatchReport, Fields, Record, RecordSink, RecordSource,
};

use crate::client::ApiClient;
use crate::ApiError;

/// Page size for record listing (platform maximum).
const PAGE_SIZE: usize = 500;
/// Batch write chunk size (platform maximum per call).
const CHUNK_SIZE: usize = 500;
/// Pause between consecutive batch chunks to stay clear of rate limits.
const CHUNK_PAUSE: Duration = Duration::from_millis(200);

#[derive(Debug, Deserialize)]
struct RecordPage {
    #[serde(default)]
    items: Vec<ApiRecord>,
    #[serde(default)]
    has_more: bool,
    #[serde(default)]
    page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiRecord {
    #[serde(default)]
    record_id: Option<String>,
    #[serde(default)]
    fields: Fields,
}

#[derive(Debug, Deserialize)]
struct FieldItems {
    #[serde(default)]
    items: Vec<FieldInfo>,
}

/// Field metadata of a table.
#[derive(Debug, Clone, Deserialize)]
pub struct FieldInfo {
    pub field_name: String,
    /// Platform field type number.
    #[serde(rename = "type")]
    pub field_type: i64,
}

#[derive(Debug, Deserialize)]
struct BatchCreated {
    #[serde(default)]
    records: Vec<ApiRecord>,
}

/// Records client scoped to one base.
#[derive(Clone)]
pub struct Bitable {
    api: Arc<ApiClient>,
    app_token: String,
}

impl Bitable {
    pub fn new(api: Arc<ApiClient>, app_token: impl Into<String>) -> Self {
        Self {
            api,
            app_token: app_token.into(),
        }
    }

    fn table_path(&self, table_id: &str, suffix: &str) -> String {
        format!(
            "/bitable/v1/apps/{}/tables/{}{}",
            self.app_token, table_id, suffix
        )
    }

    /// List a table's field metadata.
    pub async fn list_fields(&self, table_id: &str) -> Result<Vec<FieldInfo>, ApiError> {
        let data: FieldItems = self
            .api
            .get(&self.table_path(table_id, "/fields"), &[])
            .await?;
        Ok(data.items)
    }

    /// Fetch every record of a table, following pagination.
    pub async fn list_all_records(&self, table_id: &str) -> Result<Vec<Record>, ApiError> {
        let mut records = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut query = vec![("page_size".to_string(), PAGE_SIZE.to_string())];
            if let Some(token) = &page_token {
                query.push(("page_token".to_string(), token.clone()));
            }
            let page: RecordPage = self
                .api
                .get(&self.table_path(table_id, "/records"), &query)
                .await?;
            records.extend(page.items.into_iter().map(|r| Record {
                record_id: r.record_id,
                fields: r.fields,
            }));
            if !page.has_more {
                break;
            }
            page_token = page.page_token;
            if page_token.is_none() {
                warn!(table_id, "has_more set but no page_token; stopping");
                break;
            }
        }

        debug!(table_id, count = records.len(), "fetched records");
        Ok(records)
    }

    /// Create records in chunks of 500, collecting per-chunk failures.
    pub async fn batch_create(
        &self,
        table_id: &str,
        records: &[Fields],
    ) -> Result<BatchReport, ApiError> {
        let mut report = BatchReport {
            total: records.len(),
            ..Default::default()
        };

        for (offset, chunk) in chunked(records, CHUNK_SIZE) {
            let body = serde_json::json!({
                "records": chunk
                    .iter()
                    .map(|fields| serde_json::json!({ "fields": fields }))
                    .collect::<Vec<_>>(),
            });
            let result: Result<BatchCreated, ApiError> = self
                .api
                .post(&self.table_path(table_id, "/records/batch_create"), &body)
                .await;
            match result {
                Ok(created) => {
                    report.done += chunk.len();
                    report
                        .created_ids
                        .extend(created.records.into_iter().filter_map(|r| r.record_id));
                }
                Err(e) => {
                    warn!(table_id, offset, error = %e, "batch-create chunk failed");
                    report.errors.push(BatchChunkError {
                        offset,
                        count: chunk.len(),
                        error: e.to_string(),
                    });
                }
            }
            if offset + chunk.len() < records.len() {
                tokio::time::sleep(CHUNK_PAUSE).await;
            }
        }

        Ok(report)
    }

    /// Update records in chunks of 500, keyed by record id.
    pub async fn batch_update(
        &self,
        table_id: &str,
        updates: &IndexMap<String, Fields>,
    ) -> Result<BatchReport, ApiError> {
        let entries: Vec<(&String, &Fields)> = updates.iter().collect();
        let mut report = BatchReport {
            total: entries.len(),
            ..Default::default()
        };

        for (offset, chunk) in chunked(&entries, CHUNK_SIZE) {
            let body = serde_json::json!({
                "records": chunk
                    .iter()
                    .map(|(record_id, fields)| {
                        serde_json::json!({ "record_id": record_id, "fields": fields })
                    })
                    .collect::<Vec<_>>(),
            });
            let result: Result<serde_json::Value, ApiError> = self
                .api
                .post(&self.table_path(table_id, "/records/batch_update"), &body)
                .await;
            match result {
                Ok(_) => report.done += chunk.len(),
                Err(e) => {
                    warn!(table_id, offset, error = %e, "batch-update chunk failed");
                    report.errors.push(BatchChunkError {
                        offset,
                        count: chunk.len(),
                        error: e.to_string(),
                    });
                }
            }
            if offset + chunk.len() < entries.len() {
                tokio::time::sleep(CHUNK_PAUSE).await;
            }
        }

        Ok(report)
    }
}

/// Split a slice into `(offset, chunk)` pairs.
fn chunked<T>(items: &[T], size: usize) -> impl Iterator<Item = (usize, &[T])> {
    items.chunks(size).enumerate().map(move |(i, c)| (i * size, c))
}

#[async_trait::async_trait]
impl RecordSource for Bitable {
    async fn fetch_all(&self, table_id: &str) -> Result<Vec<Record>, BaseopsError> {
        Ok(self.list_all_records(table_id).await?)
    }
}

#[async_trait::async_trait]
impl RecordSink for Bitable {
    async fn create_batch(
        &self,
        table_id: &str,
        records: &[Fields],
    ) -> Result<BatchReport, BaseopsError> {
        Ok(self.batch_create(table_id, records).await?)
    }

    async fn update_batch(
        &self,
        table_id: &str,
        updates: &IndexMap<String, Fields>,
    ) -> Result<BatchReport, BaseopsError> {
        Ok(self.batch_update(table_id, updates).await?)
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunked_offsets() {
        let items: Vec<u32> = (0..1250).collect();
        let chunks: Vec<(usize, usize)> = chunked(&items, 500)
            .map(|(offset, chunk)| (offset, chunk.len()))
            .collect();
        assert_eq!(chunks, vec![(0, 500), (500, 500), (1000, 250)]);
    }

    #[test]
    fn chunked_empty_yields_nothing() {
        let items: Vec<u32> = Vec::new();
        assert_eq!(chunked(&items, 500).count(), 0);
    }

    #[test]
    fn record_page_parses_platform_shape() {
        let json = r#"{
            "items": [
                {"record_id": "rec1", "fields": {"Name": "A", "Qty": 3}},
                {"record_id": "rec2", "fields": {"Name": [{"text": "B"}]}}
            ],
            "has_more": true,
            "page_token": "next"
        }"#;
        let page: RecordPage = serde_json::from_str(json).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].record_id.as_deref(), Some("rec1"));
        assert!(page.has_more);
        assert_eq!(page.page_token.as_deref(), Some("next"));
    }

    #[test]
    fn field_info_parses_type_field() {
        let json = r#"{"items": [{"field_name": "Store Name", "type": 1}]}"#;
        let fields: FieldItems = serde_json::from_str(json).unwrap();
        assert_eq!(fields.items[0].field_name, "Store Name");
        assert_eq!(fields.items[0].field_type, 1);
    }
}
