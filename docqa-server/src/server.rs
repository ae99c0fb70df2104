//! HTTP surface: routing, document endpoints, static pages.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    response::{Html, IntoResponse},
    routing::{delete, get, post},
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use docqa_agent::ChatModel;
use docqa_rag::IngestPipeline;

use crate::error::ApiError;
use crate::protocol::{DeleteResponse, ListResponse, UploadResponse, UploadResult};
use crate::ws::ws_chat;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<IngestPipeline>,
    pub model: Arc<dyn ChatModel>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 8000 }
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(index))
        .route("/chat", get(chat_page))
        .route("/health", get(health))
        .route("/documents", post(upload_documents).get(list_documents))
        .route("/documents/{doc_id}", delete(delete_document))
        .route("/ws/chat", get(ws_chat))
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for docqa server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("docqa listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

async fn index() -> impl IntoResponse {
    Html(include_str!("../assets/index.html"))
}

async fn chat_page() -> impl IntoResponse {
    Html(include_str!("../assets/chat.html"))
}

async fn health() -> impl IntoResponse {
    Json(json!({"status":"ok"}))
}

/// Ingest each uploaded file in order; the first failure aborts the request.
async fn upload_documents(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut results = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart request: {e}")))?
    {
        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("failed to read '{filename}': {e}")))?;

        info!(filename, size = bytes.len(), "ingesting uploaded file");
        let summary = state.pipeline.ingest_file(&filename, &bytes).await?;
        results.push(UploadResult::from_summary(summary));
    }

    if results.is_empty() {
        return Err(ApiError::BadRequest("no files in upload".to_string()));
    }

    let total_documents = state.pipeline.document_count().await;
    Ok(Json(UploadResponse { total_documents, results }))
}

async fn list_documents(State(state): State<AppState>) -> Json<ListResponse> {
    let documents = state.pipeline.list_documents().await;
    Json(ListResponse { total_documents: documents.len(), documents })
}

async fn delete_document(
    State(state): State<AppState>,
    Path(doc_id): Path<String>,
) -> Result<Json<DeleteResponse>, ApiError> {
    let deleted = state.pipeline.delete_document(&doc_id).await?;
    let message = if deleted {
        format!("Document {doc_id} deleted")
    } else {
        format!("Document {doc_id} not found")
    };
    Ok(Json(DeleteResponse { message, deleted }))
}
