//! # docqa-rag
//!
//! Document ingestion and retrieval for the docqa service.
//!
//! This crate provides the ingest-side pipeline — extract → chunk → embed →
//! upsert — and the retrieval primitives the answering agent builds on:
//!
//! - **Text extraction**: [`extract_text`] for PDF, plain-text, and JSON uploads
//! - **Chunking**: [`Chunker`] trait with [`FixedSizeChunker`]
//! - **Embeddings**: [`EmbeddingProvider`] trait with [`OpenAIEmbeddingProvider`]
//! - **Vector storage**: [`VectorStore`] trait with [`InMemoryVectorStore`]
//!   and [`PineconeVectorStore`]
//! - **Document registry**: [`DocumentRegistry`] for listing without
//!   similarity queries
//! - **Orchestration**: [`IngestPipeline`]
//!
//! ## Architecture
//!
//! ```text
//! Upload → extract_text → Chunker → EmbeddingProvider → VectorStore
//!                                                           ↓
//!                                    query text → retrieve → ScoredRecord
//! ```

pub mod chunking;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod inmemory;
pub mod openai;
pub mod pinecone;
pub mod pipeline;
pub mod registry;
pub mod vectorstore;

pub use chunking::{Chunker, FixedSizeChunker};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{DocumentSummary, RecordMetadata, ScoredRecord, VectorRecord};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use extract::extract_text;
pub use inmemory::InMemoryVectorStore;
pub use openai::OpenAIEmbeddingProvider;
pub use pinecone::PineconeVectorStore;
pub use pipeline::{IngestPipeline, IngestPipelineBuilder};
pub use registry::DocumentRegistry;
pub use vectorstore::VectorStore;
