//! Error types for the `docqa-rag` crate.

use thiserror::Error;

/// Errors that can occur during ingestion and retrieval.
#[derive(Debug, Error)]
pub enum RagError {
    /// An uploaded file has an extension the extractor does not handle.
    #[error("Unsupported file type '{extension}' (use .pdf, .txt, or .json)")]
    UnsupportedFileType {
        /// The offending extension, without the leading dot.
        extension: String,
    },

    /// A supported file could not be parsed into text.
    #[error("Extraction failed for '{filename}': {message}")]
    Extract {
        /// The name of the file that failed.
        filename: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector store backend.
    #[error("Vector store error ({backend}): {message}")]
    VectorStore {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error in the ingestion pipeline orchestration.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// A convenience result type for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;
