use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::EnvFilter;

use docqa_agent::{ChatModel, OpenAIChatModel};
use docqa_rag::{
    FixedSizeChunker, IngestPipeline, InMemoryVectorStore, OpenAIEmbeddingProvider,
    PineconeVectorStore, RagConfig, VectorStore,
};
use docqa_server::server::{AppState, ServerConfig, run_server};
use docqa_server::settings::{Settings, VectorBackend};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::from_env().context("failed to load settings")?;

    let default_level = if settings.debug { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = RagConfig::default();

    let mut embedder = OpenAIEmbeddingProvider::new(settings.openai_api_key.clone())?;
    if let Some(model) = &settings.embed_model {
        embedder = embedder.with_model(model.clone());
    }

    let store: Arc<dyn VectorStore> = match settings.backend {
        VectorBackend::Pinecone => {
            // from_env guarantees these are present for this backend.
            let api_key = settings.pinecone_api_key.clone().unwrap_or_default();
            let index = settings.pinecone_index.clone().unwrap_or_default();
            let region = settings.pinecone_region.clone().unwrap_or_default();
            info!(index, region, "using Pinecone vector store");
            Arc::new(PineconeVectorStore::new(api_key, index, region)?)
        }
        VectorBackend::Memory => {
            info!("using in-memory vector store");
            Arc::new(InMemoryVectorStore::new())
        }
    };

    let pipeline = Arc::new(
        IngestPipeline::builder()
            .config(config.clone())
            .embedding_provider(Arc::new(embedder))
            .vector_store(store)
            .chunker(Arc::new(FixedSizeChunker::new(config.chunk_size, config.chunk_overlap)))
            .build()?,
    );

    pipeline.ensure_ready().await.context("vector store is not ready")?;

    let mut chat_model = OpenAIChatModel::new(settings.openai_api_key.clone())?;
    if let Some(model) = &settings.chat_model {
        chat_model = chat_model.with_model(model.clone());
    }
    let model: Arc<dyn ChatModel> = Arc::new(chat_model);

    let server_config = ServerConfig { host: settings.host.clone(), port: settings.port };
    run_server(server_config, AppState { pipeline, model }).await
}
