//! WebSocket chat: one question in flight per connection.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use docqa_agent::{ChannelSink, DocAgent, RetrieverTool};

use crate::protocol::{ChatFrame, ChatInput};
use crate::server::AppState;

pub async fn ws_chat(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: AppState) {
    info!("chat connection opened");

    while let Some(Ok(message)) = socket.recv().await {
        let raw = match message {
            Message::Text(raw) => raw,
            Message::Close(_) => break,
            _ => continue,
        };

        match parse_input(&raw) {
            Some(input) => {
                if answer_question(&mut socket, &state, input).await.is_err() {
                    break;
                }
            }
            None => {
                let frame = ChatFrame::Error { message: "Empty input received.".to_string() };
                if send_frame(&mut socket, &frame).await.is_err() {
                    break;
                }
            }
        }
    }

    info!("chat connection closed");
}

/// Run the agent for one question, forwarding tokens as they stream.
///
/// Returns `Err` only when the socket is gone; agent failures become an
/// `error` frame and the connection stays open.
async fn answer_question(
    socket: &mut WebSocket,
    state: &AppState,
    question: String,
) -> Result<(), axum::Error> {
    debug!(question = %question, "answering question");

    let (tx, mut rx) = mpsc::channel(64);
    let tool = Arc::new(RetrieverTool::new(state.pipeline.clone()));
    let agent = DocAgent::new(state.model.clone(), tool);

    let run = tokio::spawn(async move {
        let sink = ChannelSink::new(tx);
        agent.run(&question, &sink).await
    });

    while let Some(token) = rx.recv().await {
        send_frame(socket, &ChatFrame::Text { text: token }).await?;
    }

    let frame = match run.await {
        Ok(Ok(answer)) => ChatFrame::Answer { message: answer },
        Ok(Err(e)) => {
            warn!(error = %e, "agent run failed");
            ChatFrame::Error { message: e.to_string() }
        }
        Err(e) => {
            warn!(error = %e, "agent task panicked");
            ChatFrame::Error { message: "internal error".to_string() }
        }
    };
    send_frame(socket, &frame).await
}

async fn send_frame(socket: &mut WebSocket, frame: &ChatFrame) -> Result<(), axum::Error> {
    // Frames are plain data; serialization cannot fail.
    let json = serde_json::to_string(frame).unwrap_or_default();
    socket.send(Message::Text(json.into())).await
}

/// Parse one inbound frame; `None` means the empty-input error applies.
fn parse_input(raw: &str) -> Option<String> {
    let input = serde_json::from_str::<ChatInput>(raw).ok()?.input;
    let trimmed = input.trim();
    if trimmed.is_empty() { None } else { Some(trimmed.to_string()) }
}
