//! Transport-agnostic token streaming.
//!
//! The agent writes generated tokens to a [`TokenSink`] without knowing
//! anything about the transport behind it; the server binds a sink to a
//! WebSocket connection, tests bind one to a channel or nothing at all.

use async_trait::async_trait;
use tokio::sync::mpsc;

/// Receives answer tokens in generation order.
///
/// `send_token` may suspend on backpressure. A sink whose consumer has
/// gone away should return without error; the agent keeps generating and
/// the result is discarded by the caller.
#[async_trait]
pub trait TokenSink: Send + Sync {
    /// Deliver one token of answer text.
    async fn send_token(&self, text: &str);
}

/// A sink that forwards tokens into an `mpsc` channel.
pub struct ChannelSink {
    tx: mpsc::Sender<String>,
}

impl ChannelSink {
    /// Create a sink wrapping the given sender.
    pub fn new(tx: mpsc::Sender<String>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl TokenSink for ChannelSink {
    async fn send_token(&self, text: &str) {
        // A closed receiver means the consumer disconnected; drop the token.
        let _ = self.tx.send(text.to_string()).await;
    }
}

/// A sink that discards all tokens.
pub struct NullSink;

#[async_trait]
impl TokenSink for NullSink {
    async fn send_token(&self, _text: &str) {}
}
