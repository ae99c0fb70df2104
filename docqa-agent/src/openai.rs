//! OpenAI chat model with streaming tool calls.
//!
//! Calls the chat completions API directly with `reqwest`, parsing the SSE
//! response with `eventsource-stream`. Tool-call argument deltas are
//! accumulated per index and emitted as complete [`ChatEvent::ToolCall`]s
//! when the round finishes.

use async_stream::try_stream;
use eventsource_stream::Eventsource;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};

use crate::error::{AgentError, Result};
use crate::model::{
    ChatEvent, ChatEventStream, ChatMessage, ChatModel, ChatRequest, FinishReason, Role, ToolCall,
    ToolChoice,
};

/// The default OpenAI chat completions endpoint.
const OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";

/// The default chat model.
const DEFAULT_MODEL: &str = "gpt-4.1";

/// SSE sentinel terminating a streamed completion.
const DONE_SENTINEL: &str = "[DONE]";

/// A [`ChatModel`] backed by the OpenAI chat completions API.
pub struct OpenAIChatModel {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl OpenAIChatModel {
    /// Create a new client with the given API key and the default model.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(AgentError::Model("API key must not be empty".into()));
        }
        Ok(Self { client: reqwest::Client::new(), api_key, model: DEFAULT_MODEL.into() })
    }

    /// Set the model name (e.g. `gpt-4.1-mini`).
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

// ── OpenAI wire types ──────────────────────────────────────────────

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    stream: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<WireTool<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<&'static str>,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<WireToolCall<'a>>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<&'a str>,
}

#[derive(Serialize)]
struct WireToolCall<'a> {
    id: &'a str,
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionCall<'a>,
}

#[derive(Serialize)]
struct WireFunctionCall<'a> {
    name: &'a str,
    arguments: &'a str,
}

#[derive(Serialize)]
struct WireTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: WireFunctionSpec<'a>,
}

#[derive(Serialize)]
struct WireFunctionSpec<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Deserialize, Default)]
struct StreamDelta {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ToolCallDelta>,
}

#[derive(Deserialize)]
struct ToolCallDelta {
    index: usize,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    function: Option<FunctionDelta>,
}

#[derive(Deserialize, Default)]
struct FunctionDelta {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    arguments: Option<String>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── Conversions ────────────────────────────────────────────────────

fn wire_message(message: &ChatMessage) -> WireMessage<'_> {
    let role = match message.role {
        Role::System => "system",
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::Tool => "tool",
    };

    let tool_calls = if message.tool_calls.is_empty() {
        None
    } else {
        Some(
            message
                .tool_calls
                .iter()
                .map(|call| WireToolCall {
                    id: &call.id,
                    kind: "function",
                    function: WireFunctionCall { name: &call.name, arguments: &call.arguments },
                })
                .collect(),
        )
    };

    // Assistant messages that only carry tool calls omit content entirely.
    let content = if message.content.is_empty() && tool_calls.is_some() {
        None
    } else {
        Some(message.content.as_str())
    };

    WireMessage { role, content, tool_calls, tool_call_id: message.tool_call_id.as_deref() }
}

/// In-flight accumulation of one streamed tool call.
#[derive(Default)]
struct PendingToolCall {
    id: String,
    name: String,
    arguments: String,
}

impl PendingToolCall {
    fn apply(&mut self, delta: ToolCallDelta) {
        if let Some(id) = delta.id {
            self.id = id;
        }
        if let Some(function) = delta.function {
            if let Some(name) = function.name {
                self.name.push_str(&name);
            }
            if let Some(arguments) = function.arguments {
                self.arguments.push_str(&arguments);
            }
        }
    }

    fn finish(self) -> ToolCall {
        ToolCall { id: self.id, name: self.name, arguments: self.arguments }
    }
}

fn parse_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "tool_calls" => FinishReason::ToolCalls,
        "stop" => FinishReason::Stop,
        _ => FinishReason::Truncated,
    }
}

// ── ChatModel implementation ───────────────────────────────────────

#[async_trait::async_trait]
impl ChatModel for OpenAIChatModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn chat(&self, request: ChatRequest) -> Result<ChatEventStream> {
        let tool_choice = match (&request.tool_choice, request.tools.is_empty()) {
            (_, true) => None,
            (ToolChoice::Auto, false) => Some("auto"),
            (ToolChoice::Required, false) => Some("required"),
        };

        let body = WireRequest {
            model: &self.model,
            messages: request.messages.iter().map(wire_message).collect(),
            stream: true,
            tools: request
                .tools
                .iter()
                .map(|tool| WireTool {
                    kind: "function",
                    function: WireFunctionSpec {
                        name: &tool.name,
                        description: &tool.description,
                        parameters: &tool.parameters,
                    },
                })
                .collect(),
            tool_choice,
        };

        debug!(model = %self.model, messages = request.messages.len(), "starting chat completion");

        let response = self
            .client
            .post(OPENAI_CHAT_URL)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "chat completion request failed");
                AgentError::Model(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(%status, "chat completion API error");
            return Err(AgentError::Model(format!("API returned {status}: {detail}")));
        }

        let mut events = response.bytes_stream().eventsource();

        let stream = try_stream! {
            let mut pending: Vec<PendingToolCall> = Vec::new();
            let mut finish = None;

            while let Some(event) = events.next().await {
                let event = event
                    .map_err(|e| AgentError::Model(format!("stream error: {e}")))?;
                if event.data == DONE_SENTINEL {
                    break;
                }

                let chunk: StreamChunk = serde_json::from_str(&event.data)
                    .map_err(|e| AgentError::Model(format!("malformed stream chunk: {e}")))?;

                for choice in chunk.choices {
                    if let Some(content) = choice.delta.content {
                        if !content.is_empty() {
                            yield ChatEvent::Token(content);
                        }
                    }

                    for delta in choice.delta.tool_calls {
                        if delta.index >= pending.len() {
                            pending.resize_with(delta.index + 1, PendingToolCall::default);
                        }
                        pending[delta.index].apply(delta);
                    }

                    if let Some(reason) = choice.finish_reason {
                        finish = Some(parse_finish_reason(&reason));
                    }
                }
            }

            for call in pending {
                yield ChatEvent::ToolCall(call.finish());
            }

            yield ChatEvent::Finished(finish.unwrap_or(FinishReason::Stop));
        };

        Ok(Box::pin(stream))
    }
}
