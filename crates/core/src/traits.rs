//! Collaborator traits for the remote platform.
//!
//! The engine crates are pure functions over injected records; only the
//! scheduler runner and the CLI talk to these traits. The HTTP client crate
//! provides the production implementations.

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::BaseopsError;
use crate::value::{Fields, Record};

/// Reference to a published document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentRef {
    pub token: String,
    pub url: String,
    pub title: String,
}

/// Outcome of a chunked batch write.
///
/// Batch calls are atomic per chunk but not across chunks; failed chunks
/// are collected here rather than aborting or being swallowed.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    /// Records successfully written.
    pub done: usize,
    /// Records attempted.
    pub total: usize,
    /// Identifiers assigned to created records (create calls only).
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub created_ids: Vec<String>,
    /// One entry per failed chunk.
    pub errors: Vec<BatchChunkError>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchChunkError {
    /// Index of the first record in the failed chunk.
    pub offset: usize,
    /// Number of records in the failed chunk.
    pub count: usize,
    pub error: String,
}

impl BatchReport {
    pub fn is_partial_failure(&self) -> bool {
        !self.errors.is_empty() && self.done > 0
    }

    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Read side of a remote table.
#[async_trait::async_trait]
pub trait RecordSource: Send + Sync {
    /// Fetch every record of a table (pagination is the implementor's
    /// concern).
    async fn fetch_all(&self, table_id: &str) -> Result<Vec<Record>, BaseopsError>;
}

/// Write side of a remote table.
#[async_trait::async_trait]
pub trait RecordSink: Send + Sync {
    /// Create records in bulk; returns a per-chunk outcome report.
    async fn create_batch(
        &self,
        table_id: &str,
        records: &[Fields],
    ) -> Result<BatchReport, BaseopsError>;

    /// Update records in bulk, keyed by record id.
    async fn update_batch(
        &self,
        table_id: &str,
        updates: &IndexMap<String, Fields>,
    ) -> Result<BatchReport, BaseopsError>;
}

/// Destination for rendered report text.
#[async_trait::async_trait]
pub trait DocumentPublisher: Send + Sync {
    /// Publish a fully rendered body under the given title.
    async fn publish_document(
        &self,
        title: &str,
        body: &str,
    ) -> Result<DocumentRef, BaseopsError>;
}
