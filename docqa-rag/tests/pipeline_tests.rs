//! End-to-end ingestion pipeline tests against the in-memory store with a
//! deterministic fake embedding provider.

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa_rag::{
    EmbeddingProvider, FixedSizeChunker, IngestPipeline, InMemoryVectorStore, RagConfig, RagError,
    VectorStore,
};

const DIM: usize = 8;

/// Deterministic embedder: hashes the text into a fixed-dimension vector.
/// Counts calls so tests can assert batching behavior.
struct FakeEmbedder {
    calls: AtomicUsize,
}

impl FakeEmbedder {
    fn new() -> Self {
        Self { calls: AtomicUsize::new(0) }
    }
}

#[async_trait]
impl EmbeddingProvider for FakeEmbedder {
    async fn embed(&self, text: &str) -> docqa_rag::Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut v = vec![0.0f32; DIM];
        for (i, b) in text.bytes().enumerate() {
            v[i % DIM] += f32::from(b) / 255.0;
        }
        Ok(v)
    }

    async fn embed_batch(&self, texts: &[&str]) -> docqa_rag::Result<Vec<Vec<f32>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            let mut v = vec![0.0f32; DIM];
            for (i, b) in text.bytes().enumerate() {
                v[i % DIM] += f32::from(b) / 255.0;
            }
            out.push(v);
        }
        Ok(out)
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

/// Embedder that always fails, for abort-path tests.
struct FailingEmbedder;

#[async_trait]
impl EmbeddingProvider for FailingEmbedder {
    async fn embed(&self, _text: &str) -> docqa_rag::Result<Vec<f32>> {
        Err(RagError::Embedding { provider: "fake".into(), message: "service down".into() })
    }

    fn dimensions(&self) -> usize {
        DIM
    }
}

fn build_pipeline(
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<InMemoryVectorStore>,
) -> IngestPipeline {
    let config = RagConfig::builder().chunk_size(100).chunk_overlap(20).top_k(3).build().unwrap();
    IngestPipeline::builder()
        .config(config.clone())
        .embedding_provider(embedder)
        .vector_store(store)
        .chunker(Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)))
        .build()
        .unwrap()
}

fn sample_text(len: usize) -> String {
    (0..len).map(|i| char::from(b'a' + (i % 26) as u8)).collect()
}

#[tokio::test]
async fn ingesting_files_assigns_distinct_doc_ids() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = build_pipeline(Arc::new(FakeEmbedder::new()), store);

    let mut doc_ids = HashSet::new();
    for i in 0..4 {
        let summary = pipeline
            .ingest_file(&format!("file{i}.txt"), sample_text(250).as_bytes())
            .await
            .unwrap();
        doc_ids.insert(summary.doc_id);
    }

    assert_eq!(doc_ids.len(), 4);
    assert_eq!(pipeline.document_count().await, 4);
}

#[tokio::test]
async fn chunk_indices_are_contiguous_from_zero() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = build_pipeline(Arc::new(FakeEmbedder::new()), store.clone());

    let summary = pipeline.ingest_file("doc.txt", sample_text(350).as_bytes()).await.unwrap();
    assert!(summary.chunks > 1);

    let matches = store.query(&[1.0; DIM], 100).await.unwrap();
    let mut indices: Vec<usize> = matches
        .iter()
        .filter(|m| m.metadata.doc_id == summary.doc_id)
        .map(|m| m.metadata.chunk_index)
        .collect();
    indices.sort_unstable();

    assert_eq!(indices, (0..summary.chunks).collect::<Vec<_>>());
    for m in &matches {
        assert_eq!(m.id, format!("{}_{}", m.metadata.doc_id, m.metadata.chunk_index));
    }
}

#[tokio::test]
async fn stored_text_is_truncated_to_preview_length() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = build_pipeline(Arc::new(FakeEmbedder::new()), store.clone());

    pipeline.ingest_file("doc.txt", sample_text(400).as_bytes()).await.unwrap();

    let matches = store.query(&[1.0; DIM], 100).await.unwrap();
    assert!(!matches.is_empty());
    for m in &matches {
        assert!(m.metadata.text.chars().count() <= 200);
        assert_eq!(m.metadata.source, "user_upload");
        assert_eq!(m.metadata.title, "doc.txt");
    }
}

#[tokio::test]
async fn embedding_uses_one_batch_call_per_file() {
    let embedder = Arc::new(FakeEmbedder::new());
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = build_pipeline(embedder.clone(), store);

    let summary = pipeline.ingest_file("doc.txt", sample_text(500).as_bytes()).await.unwrap();
    assert!(summary.chunks > 1);
    assert_eq!(embedder.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn empty_file_yields_zero_chunks_and_no_records() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = build_pipeline(Arc::new(FakeEmbedder::new()), store.clone());

    let summary = pipeline.ingest_file("empty.txt", b"").await.unwrap();
    assert_eq!(summary.chunks, 0);
    assert!(store.is_empty().await);

    // The document is still listed, with zero chunks.
    let listed = pipeline.list_documents().await;
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].chunks, 0);
}

#[tokio::test]
async fn embedding_failure_aborts_the_file() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = build_pipeline(Arc::new(FailingEmbedder), store.clone());

    let err = pipeline.ingest_file("doc.txt", sample_text(300).as_bytes()).await.unwrap_err();
    assert!(matches!(err, RagError::Pipeline(_)));
    assert!(store.is_empty().await);
    assert_eq!(pipeline.document_count().await, 0);
}

#[tokio::test]
async fn unsupported_extension_is_rejected_before_embedding() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = build_pipeline(Arc::new(FailingEmbedder), store);

    let err = pipeline.ingest_file("image.png", b"\x89PNG").await.unwrap_err();
    assert!(matches!(err, RagError::UnsupportedFileType { .. }));
}

#[tokio::test]
async fn deleting_a_document_removes_it_from_listing_and_store() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = build_pipeline(Arc::new(FakeEmbedder::new()), store.clone());

    let keep = pipeline.ingest_file("keep.txt", sample_text(250).as_bytes()).await.unwrap();
    let doomed = pipeline.ingest_file("drop.txt", sample_text(450).as_bytes()).await.unwrap();
    assert_eq!(pipeline.document_count().await, 2);

    let was_registered = pipeline.delete_document(&doomed.doc_id).await.unwrap();
    assert!(was_registered);

    assert_eq!(pipeline.document_count().await, 1);
    let listed = pipeline.list_documents().await;
    assert!(listed.iter().all(|d| d.doc_id != doomed.doc_id));
    assert!(listed.iter().any(|d| d.doc_id == keep.doc_id));

    let matches = store.query(&[1.0; DIM], 100).await.unwrap();
    assert!(matches.iter().all(|m| m.metadata.doc_id != doomed.doc_id));
}

#[tokio::test]
async fn retrieve_returns_at_most_top_k_matches() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = build_pipeline(Arc::new(FakeEmbedder::new()), store);

    pipeline.ingest_file("doc.txt", sample_text(1000).as_bytes()).await.unwrap();

    let matches = pipeline.retrieve("abcdefgh").await.unwrap();
    assert!(matches.len() <= 3);
    assert!(!matches.is_empty());
    for pair in matches.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
}
