//! Vector store trait for storing and searching chunk embeddings.

use async_trait::async_trait;

use crate::document::{ScoredRecord, VectorRecord};
use crate::error::Result;

/// A storage backend for chunk embeddings with similarity search.
///
/// Implementations manage a single index of [`VectorRecord`]s and support
/// idempotent upserts, cosine-ranked queries, and deletion of all records
/// belonging to one document.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new();
/// store.ensure_ready(1536).await?;
/// store.upsert(&records).await?;
/// let matches = store.query(&query_embedding, 3).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Provision the backing index if it does not exist. Idempotent.
    async fn ensure_ready(&self, dimensions: usize) -> Result<()>;

    /// Upsert records, overwriting any existing record sharing an id.
    async fn upsert(&self, records: &[VectorRecord]) -> Result<()>;

    /// Return up to `top_k` records nearest to `embedding` by cosine
    /// similarity, ordered by descending score.
    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>>;

    /// Delete every record whose metadata `doc_id` matches.
    async fn delete_document(&self, doc_id: &str) -> Result<()>;
}
