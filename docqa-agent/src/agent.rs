//! The retrieval-augmented answering agent.

use std::sync::Arc;

use futures::StreamExt;
use tracing::{debug, info, warn};

use crate::error::{AgentError, Result};
use crate::model::{
    ChatEvent, ChatMessage, ChatModel, ChatRequest, ToolCall, ToolChoice, ToolSpec,
};
use crate::sink::TokenSink;
use crate::tool::Tool;

/// The grounding contract given to the model on every run.
const SYSTEM_PROMPT: &str = "\
Role:
You are an intelligent and reliable document question-answering assistant.

Your job is to help the user answer questions **based only on the information found in the provided documents**.

You are given:
- A user question.
- One or more document snippets retrieved via semantic search.

Your goals:
1. Carefully read and understand the retrieved document context.
2. Use that context to produce a clear, factual, and concise answer.
3. If the answer cannot be found in the documents, explicitly say:
   \"The information needed to answer this question is not available in the provided documents.\"
4. When appropriate, include a short citation or reference to the source document title or ID.
5. Never invent facts or add external information not found in the documents.
6. Answer in a professional and neutral tone.

Follow this format strictly:
---
**Answer:** <Your answer>

**Sources:** <Comma-separated list of titles or document IDs you used>
---
";

/// A single-question answering agent.
///
/// Each run holds one conversation: the model is forced to call the
/// retrieval tool on the first round, may retrieve again up to
/// `max_rounds` times, and then must answer. Tokens stream to the
/// provided [`TokenSink`] as they are generated.
pub struct DocAgent {
    model: Arc<dyn ChatModel>,
    tool: Arc<dyn Tool>,
    max_rounds: usize,
}

impl DocAgent {
    /// Default number of tool-call rounds before the model is forced to answer.
    pub const DEFAULT_MAX_ROUNDS: usize = 3;

    /// Create an agent over the given model and retrieval tool.
    pub fn new(model: Arc<dyn ChatModel>, tool: Arc<dyn Tool>) -> Self {
        Self { model, tool, max_rounds: Self::DEFAULT_MAX_ROUNDS }
    }

    /// Set the maximum number of tool-call rounds.
    pub fn with_max_rounds(mut self, max_rounds: usize) -> Self {
        self.max_rounds = max_rounds.max(1);
        self
    }

    /// Answer one question, streaming tokens to `sink`.
    ///
    /// Returns the final answer text. Tool failures are reported back to
    /// the model as tool results rather than aborting the run; model and
    /// stream failures abort with [`AgentError::Model`].
    pub async fn run(&self, question: &str, sink: &dyn TokenSink) -> Result<String> {
        let mut messages =
            vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(question)];

        let tools = vec![ToolSpec {
            name: self.tool.name().to_string(),
            description: self.tool.description().to_string(),
            parameters: self.tool.parameters_schema(),
        }];

        // Tool rounds, then one final round with no tools offered.
        for round in 0..=self.max_rounds {
            let is_final = round == self.max_rounds;
            let request = ChatRequest {
                messages: messages.clone(),
                tools: if is_final { Vec::new() } else { tools.clone() },
                // Retrieval must happen before the first answer.
                tool_choice: if round == 0 { ToolChoice::Required } else { ToolChoice::Auto },
            };

            debug!(round, is_final, model = self.model.name(), "starting agent round");
            let (text, tool_calls) = self.stream_round(request, sink).await?;

            if tool_calls.is_empty() {
                info!(round, answer_len = text.len(), "agent produced final answer");
                return Ok(text);
            }

            messages.push(ChatMessage::assistant_tool_calls(tool_calls.clone()));
            for call in tool_calls {
                let result = self.execute_tool(&call).await;
                messages.push(ChatMessage::tool_result(call.id, result));
            }
        }

        Err(AgentError::Agent("model produced no answer within the round limit".into()))
    }

    /// Drive one streamed round, forwarding tokens and collecting tool calls.
    async fn stream_round(
        &self,
        request: ChatRequest,
        sink: &dyn TokenSink,
    ) -> Result<(String, Vec<ToolCall>)> {
        let mut stream = self.model.chat(request).await?;

        let mut text = String::new();
        let mut tool_calls = Vec::new();

        while let Some(event) = stream.next().await {
            match event? {
                ChatEvent::Token(token) => {
                    sink.send_token(&token).await;
                    text.push_str(&token);
                }
                ChatEvent::ToolCall(call) => tool_calls.push(call),
                ChatEvent::Finished(reason) => {
                    debug!(?reason, "round finished");
                }
            }
        }

        Ok((text, tool_calls))
    }

    /// Execute one tool call, turning failures into model-visible text.
    async fn execute_tool(&self, call: &ToolCall) -> String {
        if call.name != self.tool.name() {
            warn!(requested = %call.name, "model requested unknown tool");
            return format!("Error: unknown tool '{}'", call.name);
        }

        let args: serde_json::Value = match serde_json::from_str(&call.arguments) {
            Ok(args) => args,
            Err(e) => {
                warn!(error = %e, "model produced malformed tool arguments");
                return format!("Error: malformed tool arguments: {e}");
            }
        };

        match self.tool.execute(args).await {
            Ok(result) => result.to_string(),
            Err(e) => {
                warn!(error = %e, "tool execution failed");
                format!("Error: {e}")
            }
        }
    }
}
