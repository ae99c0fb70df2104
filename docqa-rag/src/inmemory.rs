//! In-memory vector store using cosine similarity.
//!
//! This module provides [`InMemoryVectorStore`], a zero-dependency store
//! backed by a `HashMap` protected by a `tokio::sync::RwLock`. It is the
//! backend used in tests and for local development without credentials.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::document::{ScoredRecord, VectorRecord};
use crate::error::Result;
use crate::vectorstore::VectorStore;

/// An in-memory vector store using cosine similarity for search.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    records: RwLock<HashMap<String, VectorRecord>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently stored.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn ensure_ready(&self, _dimensions: usize) -> Result<()> {
        Ok(())
    }

    async fn upsert(&self, records: &[VectorRecord]) -> Result<()> {
        let mut store = self.records.write().await;
        for record in records {
            store.insert(record.id.clone(), record.clone());
        }
        Ok(())
    }

    async fn query(&self, embedding: &[f32], top_k: usize) -> Result<Vec<ScoredRecord>> {
        let store = self.records.read().await;

        let mut scored: Vec<ScoredRecord> = store
            .values()
            .map(|record| ScoredRecord {
                id: record.id.clone(),
                score: cosine_similarity(&record.embedding, embedding),
                metadata: record.metadata.clone(),
            })
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete_document(&self, doc_id: &str) -> Result<()> {
        let mut store = self.records.write().await;
        store.retain(|_, record| record.metadata.doc_id != doc_id);
        Ok(())
    }
}
