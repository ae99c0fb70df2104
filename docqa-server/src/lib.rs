//! # docqa-server
//!
//! The HTTP and WebSocket surface of the docqa service.
//!
//! - `POST /documents` — multipart upload; each file is extracted, chunked,
//!   embedded, and indexed
//! - `GET /documents` / `DELETE /documents/{doc_id}` — listing and removal
//! - `GET /ws/chat` — WebSocket chat streaming grounded answers

pub mod error;
pub mod protocol;
pub mod server;
pub mod settings;
pub mod ws;

pub use error::ApiError;
pub use server::{AppState, ServerConfig, app_router, run_server};
pub use settings::{Settings, SettingsError, VectorBackend};
