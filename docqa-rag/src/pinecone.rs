//! Pinecone vector store backend.
//!
//! Provides [`PineconeVectorStore`], a [`VectorStore`] over Pinecone's REST
//! API: the control plane (`api.pinecone.io`) for idempotent index
//! provisioning, and the per-index data plane host for upsert, query, and
//! metadata-filtered deletes.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, error, info};

use crate::document::{RecordMetadata, ScoredRecord, VectorRecord};
use crate::error::{RagError, Result};
use crate::vectorstore::VectorStore;

/// Pinecone control-plane base URL.
const CONTROL_PLANE_URL: &str = "https://api.pinecone.io";

/// Control-plane API version header value.
const API_VERSION: &str = "2025-01";

/// How many times to poll a freshly created index before giving up.
const READY_POLL_ATTEMPTS: u32 = 30;

/// A [`VectorStore`] backed by a Pinecone serverless index.
///
/// [`ensure_ready`](VectorStore::ensure_ready) describes the configured
/// index, creating it with cosine metric if absent, and caches the data
/// plane host for subsequent operations.
pub struct PineconeVectorStore {
    client: reqwest::Client,
    api_key: String,
    index_name: String,
    region: String,
    host: RwLock<Option<String>>,
}

impl PineconeVectorStore {
    /// Create a new Pinecone store for the named index in the given
    /// serverless region (e.g. `us-east-1`).
    pub fn new(
        api_key: impl Into<String>,
        index_name: impl Into<String>,
        region: impl Into<String>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::VectorStore {
                backend: "Pinecone".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            index_name: index_name.into(),
            region: region.into(),
            host: RwLock::new(None),
        })
    }

    fn map_err(e: reqwest::Error) -> RagError {
        RagError::VectorStore { backend: "Pinecone".into(), message: e.to_string() }
    }

    fn api_err(status: reqwest::StatusCode, body: String) -> RagError {
        RagError::VectorStore {
            backend: "Pinecone".into(),
            message: format!("API returned {status}: {body}"),
        }
    }

    async fn describe_index(&self) -> Result<Option<IndexDescription>> {
        let url = format!("{CONTROL_PLANE_URL}/indexes/{}", self.index_name);
        let response = self
            .client
            .get(&url)
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-Api-Version", API_VERSION)
            .send()
            .await
            .map_err(Self::map_err)?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::api_err(status, body));
        }

        let description: IndexDescription = response.json().await.map_err(Self::map_err)?;
        Ok(Some(description))
    }

    async fn create_index(&self, dimensions: usize) -> Result<()> {
        let body = json!({
            "name": self.index_name,
            "dimension": dimensions,
            "metric": "cosine",
            "spec": { "serverless": { "cloud": "aws", "region": self.region } }
        });

        let response = self
            .client
            .post(format!("{CONTROL_PLANE_URL}/indexes"))
            .header("Api-Key", &self.api_key)
            .header("X-Pinecone-Api-Version", API_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(Self::map_err)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(index = %self.index_name, %status, "index creation failed");
            return Err(Self::api_err(status, body));
        }

        info!(index = %self.index_name, dimensions, "created Pinecone index");
        Ok(())
    }

    /// The cached data plane base URL, set by `ensure_ready`.
    async fn data_plane_url(&self) -> Result<String> {
        let host = self.host.read().await;
        host.as_deref().map(|h| format!("https://{h}")).ok_or_else(|| RagError::VectorStore {
            backend: "Pinecone".into(),
            message: "index host unknown; call ensure_ready first".into(),
        })
    }

    async fn post_data_plane<T: Serialize>(&self, path: &str, body: &T) -> Result<reqwest::Response> {
        let url = format!("{}{path}", self.data_plane_url().await?);
        let response = self
            .client
            .post(&url)
            .header("Api-Key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(Self::map_err)?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Self::api_err(status, body));
        }
        Ok(response)
    }
}

// ── Pinecone API request/response types ────────────────────────────

#[derive(Deserialize)]
struct IndexDescription {
    host: String,
    status: IndexStatus,
}

#[derive(Deserialize)]
struct IndexStatus {
    ready: bool,
}

#[derive(Serialize)]
struct UpsertRequest<'a> {
    vectors: Vec<PineconeVector<'a>>,
    namespace: &'a str,
}

#[derive(Serialize)]
struct PineconeVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a RecordMetadata,
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    vector: &'a [f32],
    #[serde(rename = "topK")]
    top_k: usize,
    #[serde(rename = "includeMetadata")]
    include_metadata: bool,
    #[serde(rename = "includeValues")]
    include_values: bool,
    namespace: &'a str,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    metadata: Option<RecordMetadata>,
}

// ── VectorStore implementation ─────────────────────────────────────

#[async_trait]
impl VectorStore for PineconeVectorStore {
    async fn ensure_ready(&self, dimensions: usize) -> Result<()> {
        if self.describe_index().await?.is_none() {
            self.create_index(dimensions).await?;
        }

        // A freshly created serverless index takes a moment to come up.
        for attempt in 0..READY_POLL_ATTEMPTS {
            if let Some(description) = self.describe_index().await? {
                if description.status.ready {
                    debug!(index = %self.index_name, host = %description.host, "index ready");
                    *self.host.write().await = Some(description.host);
                    return Ok(());
                }
            }
            debug!(index = %self.index_name, attempt, "waiting for index to become ready");
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        Err(RagError::VectorStore {
            backend: "Pinecone".into(),
            message: format!("index '{}' did not become ready", self.index_name),
        })
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let request = UpsertRequest {
            vectors: records
                .iter()
                .map(|r| PineconeVector { id: &r.id, values: &r.embedding, metadata: &r.metadata })
                .collect(),
            namespace: "",
        };

        self.post_data_plane("/vectors/upsert", &request).await?;
        debug!(count = records.len(), "upserted records to Pinecone");
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> {
        let request = QueryRequest {
            vector: embedding,
            top_k,
            include_metadata: true,
            include_values: false,
            namespace: "",
        };

        let response = self.post_data_plane("/query", &request).await?;
        let parsed: QueryResponse = response.json().await.map_err(Self::map_err)?;

        Ok(parsed
            .matches
            .into_iter()
            .filter_map(|m| {
                m.metadata.map(|metadata| ScoredRecord { id: m.id, score: m.score, metadata })
            })
            .collect())
    }

    async fn delete_document(&self, doc_id: &str) -> Result<()> {
        let request = json!({
            "filter": { "doc_id": { "$eq": doc_id } },
            "namespace": ""
        });

        self.post_data_plane("/vectors/delete", &request).await?;
        debug!(doc_id, "deleted document records from Pinecone");
        Ok(())
    }
}
