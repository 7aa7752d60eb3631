//! Generator trait and the timeout/retry wrapper around it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::config::RetryPolicy;
use crate::error::{RagError, Result};
use crate::prompt::Prompt;

/// A generative model that turns a [`Prompt`] into text.
///
/// Implementations perform a single call to their backend. Timeouts and
/// retries are layered on top by [`GeneratorClient`].
///
/// # Example
///
/// ```rust,ignore
/// use mojo_rag::{Generator, Prompt};
///
/// let answer = generator.generate(&Prompt::new("Say hello")).await?;
/// ```
#[async_trait]
pub trait Generator: Send + Sync {
    /// Name of the backend or model, used in logs and errors.
    fn name(&self) -> &str;

    /// Execute the prompt and return the completion text.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::GenerationServiceError`] on transport or service failure.
    async fn generate(&self, prompt: &Prompt) -> Result<String>;
}

/// Wraps a [`Generator`] with an optional per-attempt timeout and a [`RetryPolicy`].
///
/// With the defaults (no timeout, [`RetryPolicy::none`]) this is a transparent
/// single call. Only transient errors ([`RagError::is_transient`]) are
/// retried; the last error is returned unchanged once attempts run out.
///
/// # Example
///
/// ```rust,ignore
/// use std::time::Duration;
/// use mojo_rag::{GeneratorClient, RetryPolicy};
///
/// let client = GeneratorClient::new(Arc::new(chat))
///     .with_timeout(Duration::from_secs(60))
///     .with_retry(RetryPolicy::exponential(3, Duration::from_millis(500)));
/// ```
#[derive(Clone)]
pub struct GeneratorClient {
    generator: Arc<dyn Generator>,
    timeout: Option<Duration>,
    retry: RetryPolicy,
}

impl GeneratorClient {
    /// Wrap `generator` with no timeout and a single attempt.
    pub fn new(generator: Arc<dyn Generator>) -> Self {
        Self { generator, timeout: None, retry: RetryPolicy::none() }
    }

    /// Fail an attempt with [`RagError::GenerationTimeoutError`] after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the optional per-attempt timeout.
    pub fn with_optional_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The per-attempt timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// The retry policy in use.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    async fn attempt(&self, prompt: &Prompt) -> Result<String> {
        let Some(timeout) = self.timeout else {
            return self.generator.generate(prompt).await;
        };

        tokio::time::timeout(timeout, self.generator.generate(prompt)).await.map_err(|_| {
            RagError::GenerationTimeoutError {
                provider: self.generator.name().to_string(),
                timeout,
            }
        })?
    }
}

impl std::fmt::Debug for GeneratorClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeneratorClient")
            .field("generator", &self.generator.name())
            .field("timeout", &self.timeout)
            .field("retry", &self.retry)
            .finish()
    }
}

#[async_trait]
impl Generator for GeneratorClient {
    fn name(&self) -> &str {
        self.generator.name()
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String> {
        let mut attempt = 1;
        loop {
            debug!(generator = self.name(), attempt, prompt_len = prompt.len(), "generating");
            match self.attempt(prompt).await {
                Ok(text) => return Ok(text),
                Err(e) if e.is_transient() && attempt < self.retry.max_attempts => {
                    let delay = self.retry.backoff_for(attempt);
                    warn!(
                        generator = self.name(),
                        attempt,
                        max_attempts = self.retry.max_attempts,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "generation failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}
