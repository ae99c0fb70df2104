//! The retrieval tool exposed to the answering agent.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{error, info};

use docqa_rag::IngestPipeline;

use crate::error::{AgentError, Result};

/// A capability the model can invoke during a run.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The name the model calls the tool by.
    fn name(&self) -> &str;

    /// A description shown to the model.
    fn description(&self) -> &str;

    /// JSON schema for the tool's arguments.
    fn parameters_schema(&self) -> Value;

    /// Execute the tool with JSON arguments, returning a JSON result.
    async fn execute(&self, args: Value) -> Result<Value>;
}

/// The agent's single capability: fetch the most relevant chunks for a query.
///
/// Wraps an [`IngestPipeline`]; the number of results is the pipeline's
/// configured `top_k`.
pub struct RetrieverTool {
    pipeline: Arc<IngestPipeline>,
}

impl RetrieverTool {
    /// The tool name the model must call before answering.
    pub const NAME: &'static str = "docs_retriever";

    /// Create a new retriever tool over the given pipeline.
    pub fn new(pipeline: Arc<IngestPipeline>) -> Self {
        Self { pipeline }
    }
}

#[async_trait]
impl Tool for RetrieverTool {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn description(&self) -> &str {
        "Always call this to fetch relevant document chunks for the user's question."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The search query to find relevant document chunks"
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let query = args
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| AgentError::Tool("missing required 'query' parameter".into()))?;

        info!(query, "docs_retriever tool called");

        let matches = self.pipeline.retrieve(query).await.map_err(|e| {
            error!(error = %e, "retrieval failed");
            AgentError::Tool(format!("retrieval failed: {e}"))
        })?;

        let results: Vec<Value> = matches
            .iter()
            .map(|m| {
                json!({
                    "title": m.metadata.title,
                    "doc_id": m.metadata.doc_id,
                    "chunk_index": m.metadata.chunk_index,
                    "score": m.score,
                    "text": m.metadata.text,
                })
            })
            .collect();

        Ok(json!({ "results": results }))
    }
}
