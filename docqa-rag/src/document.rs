//! Data types for documents, vector records, and retrieval matches.

use serde::{Deserialize, Serialize};

/// The `source` metadata value attached to every uploaded chunk.
pub const UPLOAD_SOURCE: &str = "user_upload";

/// A registered document: one uploaded file and its derived chunk count.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DocumentSummary {
    /// Unique identifier assigned at ingestion.
    pub doc_id: String,
    /// The original filename.
    pub title: String,
    /// Number of chunks written for this document.
    pub chunks: usize,
}

/// Metadata persisted alongside each vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordMetadata {
    /// The owning document's identifier.
    pub doc_id: String,
    /// The owning document's title (original filename).
    pub title: String,
    /// Zero-based position of the chunk within the document.
    pub chunk_index: usize,
    /// The chunk text, truncated to the configured preview length.
    pub text: String,
    /// Where the record came from (always [`UPLOAD_SOURCE`] for uploads).
    pub source: String,
}

/// The persisted form of a chunk: id, embedding, and metadata.
///
/// Record ids are derived deterministically as `{doc_id}_{chunk_index}`,
/// so re-upserting the same document's chunks overwrites in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VectorRecord {
    /// Unique record identifier (`{doc_id}_{chunk_index}`).
    pub id: String,
    /// The embedding vector for the chunk text.
    pub embedding: Vec<f32>,
    /// Metadata stored with the vector.
    pub metadata: RecordMetadata,
}

/// A retrieval match: a stored record's id and metadata with its score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredRecord {
    /// The matched record's identifier.
    pub id: String,
    /// Cosine similarity score (higher is more relevant).
    pub score: f32,
    /// The matched record's metadata.
    pub metadata: RecordMetadata,
}
