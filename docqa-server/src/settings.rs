//! Environment-driven service settings.

use std::env;

use thiserror::Error;

/// Which vector store backend to run against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VectorBackend {
    /// Pinecone serverless index.
    Pinecone,
    /// In-process store, for local runs and tests.
    Memory,
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {name}: {value}")]
    InvalidVar { name: &'static str, value: String },
}

/// Service configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Settings {
    pub openai_api_key: String,
    pub chat_model: Option<String>,
    pub embed_model: Option<String>,
    pub backend: VectorBackend,
    pub pinecone_api_key: Option<String>,
    pub pinecone_index: Option<String>,
    pub pinecone_region: Option<String>,
    pub host: String,
    pub port: u16,
    pub debug: bool,
}

impl Settings {
    /// Load settings from environment variables.
    ///
    /// `VECTOR_BACKEND` may be `pinecone` or `memory`; when unset, the
    /// Pinecone backend is selected iff all its variables are present.
    pub fn from_env() -> Result<Self, SettingsError> {
        let openai_api_key =
            env::var("OPENAI_API_KEY").map_err(|_| SettingsError::MissingVar("OPENAI_API_KEY"))?;

        let pinecone_api_key = env::var("PINECONE_API_KEY").ok();
        let pinecone_index = env::var("PINECONE_INDEX").ok();
        let pinecone_region = env::var("PINECONE_ENV").ok();
        let pinecone_configured =
            pinecone_api_key.is_some() && pinecone_index.is_some() && pinecone_region.is_some();

        let backend = match env::var("VECTOR_BACKEND").ok().as_deref() {
            Some("pinecone") => VectorBackend::Pinecone,
            Some("memory") => VectorBackend::Memory,
            Some(other) => {
                return Err(SettingsError::InvalidVar {
                    name: "VECTOR_BACKEND",
                    value: other.to_string(),
                });
            }
            None if pinecone_configured => VectorBackend::Pinecone,
            None => VectorBackend::Memory,
        };

        if backend == VectorBackend::Pinecone {
            if pinecone_api_key.is_none() {
                return Err(SettingsError::MissingVar("PINECONE_API_KEY"));
            }
            if pinecone_index.is_none() {
                return Err(SettingsError::MissingVar("PINECONE_INDEX"));
            }
            if pinecone_region.is_none() {
                return Err(SettingsError::MissingVar("PINECONE_ENV"));
            }
        }

        let host = env::var("DOCQA_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match env::var("DOCQA_PORT") {
            Ok(raw) => raw
                .parse()
                .map_err(|_| SettingsError::InvalidVar { name: "DOCQA_PORT", value: raw })?,
            Err(_) => 8000,
        };

        let debug = env::var("DEBUG")
            .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            openai_api_key,
            chat_model: env::var("OPENAI_CHAT_MODEL").ok(),
            embed_model: env::var("OPENAI_EMBED_MODEL").ok(),
            backend,
            pinecone_api_key,
            pinecone_index,
            pinecone_region,
            host,
            port,
            debug,
        })
    }
}
