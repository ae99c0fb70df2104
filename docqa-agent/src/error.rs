//! Error types for the `docqa-agent` crate.

use thiserror::Error;

/// Errors that can occur while running the answering agent.
#[derive(Debug, Error)]
pub enum AgentError {
    /// The language model request or stream failed.
    #[error("Model error: {0}")]
    Model(String),

    /// A tool invocation failed.
    #[error("Tool error: {0}")]
    Tool(String),

    /// The model produced no usable output.
    #[error("Agent error: {0}")]
    Agent(String),
}

/// A convenience result type for agent operations.
pub type Result<T> = std::result::Result<T, AgentError>;
