//! Documents API: create a document and append rendered report content.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use baseops_core::{BaseopsError, DocumentPublisher, DocumentRef};

use crate::blocks::markdown_to_blocks;
use crate::client::ApiClient;
use crate::ApiError;

/// Blocks appended per call (platform limit is 50 children).
const BLOCK_BATCH: usize = 50;
/// Pause between block batches to stay clear of rate limits.
const BATCH_PAUSE: Duration = Duration::from_millis(300);

#[derive(Debug, Deserialize)]
struct CreateDocumentData {
    document: DocumentInfo,
}

#[derive(Debug, Deserialize)]
struct DocumentInfo {
    #[serde(default)]
    document_id: String,
}

/// Documents client. An optional folder token places new documents.
pub struct Docs {
    api: Arc<ApiClient>,
    folder_token: Option<String>,
    /// Public host used to build share links.
    doc_host: String,
}

impl Docs {
    pub fn new(api: Arc<ApiClient>, folder_token: Option<String>) -> Self {
        Self {
            api,
            folder_token,
            doc_host: "https://my.feishu.cn/docx".to_string(),
        }
    }

    /// Create an empty document and return its token.
    pub async fn create_document(&self, title: &str) -> Result<String, ApiError> {
        let mut body = json!({ "title": title });
        if let Some(folder) = &self.folder_token {
            body["folder_token"] = json!(folder);
        }
        let data: CreateDocumentData = self.api.post("/docx/v1/documents", &body).await?;
        if data.document.document_id.is_empty() {
            return Err(ApiError::Malformed(
                "document create returned no document_id".to_string(),
            ));
        }
        Ok(data.document.document_id)
    }

    /// Append markdown content to a document as blocks, in batches.
    pub async fn append_markdown(&self, doc_token: &str, markdown: &str) -> Result<(), ApiError> {
        let blocks = markdown_to_blocks(markdown);
        let path = format!("/docx/v1/documents/{doc_token}/blocks/{doc_token}/children");

        let total = blocks.len();
        for (i, chunk) in blocks.chunks(BLOCK_BATCH).enumerate() {
            let body = json!({ "children": chunk });
            let _: serde_json::Value = self.api.post(&path, &body).await?;
            debug!(doc_token, batch = i, "appended block batch");
            if (i + 1) * BLOCK_BATCH < total {
                tokio::time::sleep(BATCH_PAUSE).await;
            }
        }
        Ok(())
    }

    fn document_url(&self, token: &str) -> String {
        format!("{}/{token}", self.doc_host)
    }
}

#[async_trait::async_trait]
impl DocumentPublisher for Docs {
    /// Create a document titled `title` and fill it with `body`.
    async fn publish_document(
        &self,
        title: &str,
        body: &str,
    ) -> Result<DocumentRef, BaseopsError> {
        let token = self.create_document(title).await?;
        self.append_markdown(&token, body).await?;
        let url = self.document_url(&token);
        info!(%url, "document published");
        Ok(DocumentRef {
            token,
            url,
            title: title.to_string(),
        })
    }
}

// ── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_document_response_parses() {
        let json = r#"{"document": {"document_id": "doccnXYZ", "title": "T"}}"#;
        let data: CreateDocumentData = serde_json::from_str(json).unwrap();
        assert_eq!(data.document.document_id, "doccnXYZ");
    }

    #[test]
    fn document_url_shape() {
        let api = Arc::new(ApiClient::new(baseops_core::ApiCredentials::new("a", "b")));
        let docs = Docs::new(api, None);
        assert_eq!(
            docs.document_url("doccnXYZ"),
            "https://my.feishu.cn/docx/doccnXYZ"
        );
    }
}
