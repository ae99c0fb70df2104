//! HTTP error mapping.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use docqa_rag::RagError;

/// Errors surfaced by the HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Rag(#[from] RagError),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Rag(RagError::UnsupportedFileType { .. }) => StatusCode::BAD_REQUEST,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.to_string();
        if status.is_server_error() {
            error!(%status, detail, "request failed");
        }
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unsupported_file_type_maps_to_400() {
        let err = ApiError::Rag(RagError::UnsupportedFileType { extension: "exe".into() });
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn other_rag_errors_map_to_500() {
        let err = ApiError::Rag(RagError::Embedding {
            provider: "openai".into(),
            message: "timeout".into(),
        });
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
