//! Ingestion pipeline orchestrator.
//!
//! The [`IngestPipeline`] coordinates the upload workflow — extract →
//! chunk → embed → upsert — and the retrieval path the answering agent
//! uses, by composing an [`EmbeddingProvider`], a [`VectorStore`], a
//! [`Chunker`], and a [`DocumentRegistry`].
//!
//! # Example
//!
//! ```rust,ignore
//! use docqa_rag::{FixedSizeChunker, IngestPipeline, InMemoryVectorStore, RagConfig};
//!
//! let pipeline = IngestPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedding_provider(Arc::new(my_embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .chunker(Arc::new(FixedSizeChunker::new(500, 50)))
//!     .build()?;
//!
//! pipeline.ensure_ready().await?;
//! let summary = pipeline.ingest_file("notes.txt", bytes).await?;
//! let matches = pipeline.retrieve("what is the refund policy?").await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use crate::chunking::Chunker;
use crate::config::RagConfig;
use crate::document::{DocumentSummary, RecordMetadata, ScoredRecord, UPLOAD_SOURCE, VectorRecord};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::extract::extract_text;
use crate::registry::DocumentRegistry;
use crate::vectorstore::VectorStore;

/// The ingestion and retrieval orchestrator.
///
/// Construct one via [`IngestPipeline::builder()`]. All collaborators are
/// injected, so tests can substitute fakes for the embedding provider and
/// the vector store.
pub struct IngestPipeline {
    config: RagConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    registry: DocumentRegistry,
}

impl std::fmt::Debug for IngestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IngestPipeline")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl IngestPipeline {
    /// Create a new [`IngestPipelineBuilder`].
    pub fn builder() -> IngestPipelineBuilder {
        IngestPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Provision the vector index if absent, using the embedding
    /// provider's dimensionality. Idempotent; called once at startup.
    pub async fn ensure_ready(&self) -> Result<()> {
        let dimensions = self.embedding_provider.dimensions();
        self.vector_store.ensure_ready(dimensions).await
    }

    /// Ingest one uploaded file: extract → chunk → embed → upsert.
    ///
    /// A fresh `doc_id` is minted per call; re-uploading the same file
    /// creates a new document. Files with no extractable text produce a
    /// summary with zero chunks and write nothing to the store.
    ///
    /// # Errors
    ///
    /// Propagates [`RagError::UnsupportedFileType`] and
    /// [`RagError::Extract`] from extraction, and wraps embedding/store
    /// failures as [`RagError::Pipeline`]. Any failure aborts this file
    /// entirely; no partial chunk set is recorded.
    pub async fn ingest_file(&self, filename: &str, bytes: &[u8]) -> Result<DocumentSummary> {
        let doc_id = Uuid::new_v4().to_string();
        let text = extract_text(filename, bytes)?;
        let chunks = self.chunker.chunk(&text);

        if chunks.is_empty() {
            info!(doc_id = %doc_id, title = filename, chunk_count = 0, "ingested empty document");
            self.registry.insert(&doc_id, filename, 0).await;
            return Ok(DocumentSummary { doc_id, title: filename.to_string(), chunks: 0 });
        }

        let texts: Vec<&str> = chunks.iter().map(String::as_str).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.map_err(|e| {
            error!(doc_id = %doc_id, error = %e, "embedding failed during ingestion");
            RagError::Pipeline(format!("embedding failed for '{filename}': {e}"))
        })?;

        if embeddings.len() != chunks.len() {
            return Err(RagError::Pipeline(format!(
                "embedding count mismatch for '{filename}': {} chunks, {} embeddings",
                chunks.len(),
                embeddings.len()
            )));
        }

        let records: Vec<VectorRecord> = chunks
            .iter()
            .zip(embeddings)
            .enumerate()
            .map(|(index, (chunk, embedding))| VectorRecord {
                id: format!("{doc_id}_{index}"),
                embedding,
                metadata: RecordMetadata {
                    doc_id: doc_id.clone(),
                    title: filename.to_string(),
                    chunk_index: index,
                    text: truncate_chars(chunk, self.config.text_preview_len),
                    source: UPLOAD_SOURCE.to_string(),
                },
            })
            .collect();

        // One upsert per file keeps the document's chunk set atomic in effect.
        self.vector_store.upsert(&records).await.map_err(|e| {
            error!(doc_id = %doc_id, error = %e, "upsert failed during ingestion");
            RagError::Pipeline(format!("upsert failed for '{filename}': {e}"))
        })?;

        let chunk_count = records.len();
        self.registry.insert(&doc_id, filename, chunk_count).await;
        info!(doc_id = %doc_id, title = filename, chunk_count, "ingested document");

        Ok(DocumentSummary { doc_id, title: filename.to_string(), chunks: chunk_count })
    }

    /// Retrieve the `top_k` most relevant records for a question.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Pipeline`] if query embedding or search fails.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<ScoredRecord>> {
        let query_embedding = self.embedding_provider.embed(query).await.map_err(|e| {
            error!(error = %e, "embedding failed during retrieval");
            RagError::Pipeline(format!("query embedding failed: {e}"))
        })?;

        let matches = self
            .vector_store
            .query(&query_embedding, self.config.top_k)
            .await
            .map_err(|e| {
                error!(error = %e, "vector store query failed");
                RagError::Pipeline(format!("retrieval failed: {e}"))
            })?;

        info!(result_count = matches.len(), "retrieval completed");
        Ok(matches)
    }

    /// Delete a document and all its chunks from the store and registry.
    ///
    /// Returns whether the document was registered in this process.
    pub async fn delete_document(&self, doc_id: &str) -> Result<bool> {
        self.vector_store.delete_document(doc_id).await?;
        let was_registered = self.registry.remove(doc_id).await;
        info!(doc_id, was_registered, "deleted document");
        Ok(was_registered)
    }

    /// List all documents known to this process.
    pub async fn list_documents(&self) -> Vec<DocumentSummary> {
        self.registry.list().await
    }

    /// Number of documents known to this process.
    pub async fn document_count(&self) -> usize {
        self.registry.len().await
    }
}

/// Truncate to at most `max_chars` characters on a char boundary.
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => text[..byte_index].to_string(),
        None => text.to_string(),
    }
}

/// Builder for constructing an [`IngestPipeline`].
///
/// All fields are required. Call [`build()`](IngestPipelineBuilder::build)
/// to validate and produce the pipeline.
#[derive(Default)]
pub struct IngestPipelineBuilder {
    config: Option<RagConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
}

impl IngestPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the text chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Build the [`IngestPipeline`], validating that all fields are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any required field is missing.
    pub fn build(self) -> Result<IngestPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::Config("chunker is required".to_string()))?;

        Ok(IngestPipeline {
            config,
            embedding_provider,
            vector_store,
            chunker,
            registry: DocumentRegistry::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("abc", 10), "abc");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn builder_requires_all_fields() {
        let err = IngestPipeline::builder().build().unwrap_err();
        assert!(matches!(err, RagError::Config(_)));
    }
}
