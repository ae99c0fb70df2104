//! In-process registry of ingested documents.
//!
//! Listing documents through the vector store would require a degenerate
//! zero-vector similarity query, so the pipeline instead records each
//! document's id, title, and chunk count here at ingest time and removes
//! the entry on delete. The registry is process-local: it empties on
//! restart while the vectors themselves survive in the store.

use std::collections::HashMap;

use tokio::sync::RwLock;

use crate::document::DocumentSummary;

#[derive(Debug, Clone)]
struct RegistryEntry {
    title: String,
    chunks: usize,
}

/// Registry of ingested documents, keyed by `doc_id`.
#[derive(Debug, Default)]
pub struct DocumentRegistry {
    entries: RwLock<HashMap<String, RegistryEntry>>,
}

impl DocumentRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document after its chunks have been upserted.
    pub async fn insert(&self, doc_id: impl Into<String>, title: impl Into<String>, chunks: usize) {
        let mut entries = self.entries.write().await;
        entries.insert(doc_id.into(), RegistryEntry { title: title.into(), chunks });
    }

    /// Remove a document. Returns whether it was registered.
    pub async fn remove(&self, doc_id: &str) -> bool {
        let mut entries = self.entries.write().await;
        entries.remove(doc_id).is_some()
    }

    /// Whether the registry knows the given document.
    pub async fn contains(&self, doc_id: &str) -> bool {
        self.entries.read().await.contains_key(doc_id)
    }

    /// Number of registered documents.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether no documents are registered.
    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    /// List all registered documents, sorted by title for stable output.
    pub async fn list(&self) -> Vec<DocumentSummary> {
        let entries = self.entries.read().await;
        let mut documents: Vec<DocumentSummary> = entries
            .iter()
            .map(|(doc_id, entry)| DocumentSummary {
                doc_id: doc_id.clone(),
                title: entry.title.clone(),
                chunks: entry.chunks,
            })
            .collect();
        documents.sort_by(|a, b| a.title.cmp(&b.title).then_with(|| a.doc_id.cmp(&b.doc_id)));
        documents
    }
}
