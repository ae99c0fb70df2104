//! # docqa-agent
//!
//! The retrieval-augmented answering agent for the docqa service.
//!
//! A [`DocAgent`] answers one question per run: it is required to call the
//! [`RetrieverTool`] before answering, grounds its reply in the retrieved
//! chunks, and streams tokens to a [`TokenSink`] as they are generated.
//!
//! - [`ChatModel`] — the seam between the agent loop and a concrete LLM
//! - [`OpenAIChatModel`] — streaming chat completions with tool calling
//! - [`Tool`] / [`RetrieverTool`] — the single retrieval capability
//! - [`TokenSink`] — transport-agnostic token streaming
//! - [`DocAgent`] — the bounded tool-call loop

pub mod agent;
pub mod error;
pub mod model;
pub mod openai;
pub mod sink;
pub mod tool;

pub use agent::DocAgent;
pub use error::{AgentError, Result};
pub use model::{
    ChatEvent, ChatEventStream, ChatMessage, ChatModel, ChatRequest, FinishReason, Role,
    ToolCall, ToolChoice, ToolSpec,
};
pub use openai::OpenAIChatModel;
pub use sink::{ChannelSink, NullSink, TokenSink};
pub use tool::{RetrieverTool, Tool};
