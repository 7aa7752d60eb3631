//! OpenAI-compatible embedding and chat backends.
//!
//! This module is only available when the `openai` feature is enabled.
//! Both backends talk to the HTTP JSON API directly through `reqwest` and
//! accept a custom base URL, so any OpenAI-compatible server works.
//!
//! # Example
//!
//! ```rust,ignore
//! use mojo_rag::openai::{OpenAIChatGenerator, OpenAIConfig, OpenAIEmbedder};
//!
//! let config = OpenAIConfig::from_env()?;
//! let embedder = OpenAIEmbedder::new(config.clone());
//! let generator = OpenAIChatGenerator::new(config);
//! ```

mod chat;
mod embedding;

pub use chat::{ChatOptions, DEFAULT_CHAT_MODEL, OpenAIChatGenerator};
pub use embedding::{
    DEFAULT_EMBEDDING_BATCH_SIZE, DEFAULT_EMBEDDING_DIMENSIONS, DEFAULT_EMBEDDING_MODEL,
    OpenAIEmbedder,
};

use serde::Deserialize;

use crate::error::{RagError, Result};

/// The default OpenAI API base URL.
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Credentials and endpoint shared by the OpenAI backends.
#[derive(Clone)]
pub struct OpenAIConfig {
    /// Bearer token sent with every request.
    pub api_key: String,
    /// API base URL without a trailing slash, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
}

impl OpenAIConfig {
    /// Create a config for the public OpenAI API.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] if `api_key` is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RagError::ConfigError("OpenAI API key must not be empty".into()));
        }
        Ok(Self { api_key, base_url: OPENAI_API_BASE.to_string() })
    }

    /// Create a config using the `OPENAI_API_KEY` environment variable.
    ///
    /// `OPENAI_BASE_URL` overrides the base URL when set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| {
            RagError::ConfigError("OPENAI_API_KEY environment variable not set".into())
        })?;
        let config = Self::new(api_key)?;
        Ok(match std::env::var("OPENAI_BASE_URL") {
            Ok(base_url) if !base_url.trim().is_empty() => config.with_base_url(base_url),
            _ => config,
        })
    }

    /// Point the backends at an OpenAI-compatible server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.base_url)
    }
}

impl std::fmt::Debug for OpenAIConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAIConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

// ── OpenAI API error body ──────────────────────────────────────────

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Read a failed response body and extract the API's error message if present.
async fn error_detail(response: reqwest::Response) -> String {
    let body = response.text().await.unwrap_or_default();
    serde_json::from_str::<ErrorResponse>(&body).map(|e| e.error.message).unwrap_or(body)
}
