//! OpenAI chat-completions backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use super::{OpenAIConfig, error_detail};
use crate::error::{RagError, Result};
use crate::generator::Generator;
use crate::prompt::Prompt;

/// The chat model the Mojo chatbot was built against.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo-16k-0613";

/// Sampling parameters sent with every completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatOptions {
    /// Model identifier.
    pub model: String,
    /// Sampling temperature. Zero keeps answers deterministic.
    pub temperature: f32,
    /// Upper bound on completion tokens. `None` leaves it to the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self { model: DEFAULT_CHAT_MODEL.to_string(), temperature: 0.0, max_tokens: None }
    }
}

/// A [`Generator`] backed by the `/chat/completions` endpoint.
///
/// The prompt is sent as a single user message and the first choice's
/// content is returned.
pub struct OpenAIChatGenerator {
    client: reqwest::Client,
    config: OpenAIConfig,
    options: ChatOptions,
}

impl OpenAIChatGenerator {
    /// Create a generator with [`ChatOptions::default`].
    pub fn new(config: OpenAIConfig) -> Self {
        Self { client: reqwest::Client::new(), config, options: ChatOptions::default() }
    }

    /// Replace the sampling options.
    pub fn with_options(mut self, options: ChatOptions) -> Self {
        self.options = options;
        self
    }

    /// Set the model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.options.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = temperature;
        self
    }

    /// Use a preconfigured HTTP client.
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.client = client;
        self
    }

    /// The sampling options in use.
    pub fn options(&self) -> &ChatOptions {
        &self.options
    }

    fn service_error(&self, message: impl Into<String>) -> RagError {
        RagError::GenerationServiceError {
            provider: format!("OpenAI/{}", self.options.model),
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

#[async_trait]
impl Generator for OpenAIChatGenerator {
    fn name(&self) -> &str {
        &self.options.model
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        debug!(
            provider = "OpenAI",
            model = %self.options.model,
            prompt_len = prompt.len(),
            "requesting chat completion"
        );

        let request_body = ChatRequest {
            model: &self.options.model,
            messages: [ChatMessage { role: "user", content: prompt.as_str() }],
            temperature: self.options.temperature,
            max_tokens: self.options.max_tokens,
        };

        let response = self
            .client
            .post(self.config.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "OpenAI", error = %e, "request failed");
                self.service_error(format!("request failed: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = error_detail(response).await;
            error!(provider = "OpenAI", %status, "API error");
            return Err(self.service_error(format!("API returned {status}: {detail}")));
        }

        let chat_response: ChatResponse = response.json().await.map_err(|e| {
            error!(provider = "OpenAI", error = %e, "failed to parse response");
            self.service_error(format!("failed to parse response: {e}"))
        })?;

        chat_response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| self.service_error("API returned no completion text"))
    }
}
