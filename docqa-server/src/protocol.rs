//! Wire types for the HTTP and WebSocket surfaces.

use serde::{Deserialize, Serialize};

use docqa_rag::DocumentSummary;

/// Result of ingesting one uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResult {
    pub doc_id: String,
    pub title: String,
    pub chunks: usize,
    pub message: String,
}

impl UploadResult {
    pub fn from_summary(summary: DocumentSummary) -> Self {
        let message = format!("'{}' uploaded and indexed ({} chunks)", summary.title, summary.chunks);
        Self { doc_id: summary.doc_id, title: summary.title, chunks: summary.chunks, message }
    }
}

/// Response to `POST /documents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    pub total_documents: usize,
    pub results: Vec<UploadResult>,
}

/// Response to `GET /documents`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListResponse {
    pub total_documents: usize,
    pub documents: Vec<DocumentSummary>,
}

/// Response to `DELETE /documents/{doc_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteResponse {
    pub message: String,
    pub deleted: bool,
}

/// An inbound chat frame: `{"input": "..."}`.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatInput {
    #[serde(default)]
    pub input: String,
}

/// An outbound chat frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ChatFrame {
    /// One streamed token of answer text.
    Text { text: String },
    /// The complete final answer.
    Answer { message: String },
    /// A failure; the connection stays open.
    Error { message: String },
}
