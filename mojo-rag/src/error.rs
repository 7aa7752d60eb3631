//! Error types for the `mojo-rag` crate.

use std::time::Duration;

use thiserror::Error;

/// Errors that can occur while building or querying the answer pipeline.
///
/// The first three variants are construction and configuration failures and
/// are meant to stop startup. The service variants are raised per query and
/// reach the caller of [`AnswerPipeline::answer`](crate::AnswerPipeline::answer)
/// exactly as the failing component produced them.
#[derive(Debug, Error)]
pub enum RagError {
    /// A document store was built from zero passages.
    #[error("Empty corpus: a document store needs at least one passage")]
    EmptyCorpusError,

    /// An embedding did not have the dimension the store expects.
    #[error("Dimension mismatch{}: expected {expected}, got {actual}", passage_suffix(.passage_id))]
    DimensionMismatchError {
        /// Dimension established when the store was built.
        expected: usize,
        /// Dimension of the offending embedding.
        actual: usize,
        /// The passage whose embedding was rejected, `None` for query embeddings.
        passage_id: Option<String>,
    },

    /// A search asked for zero results.
    #[error("Invalid k ({k}): top-k retrieval needs k greater than zero")]
    InvalidKError {
        /// The rejected value.
        k: usize,
    },

    /// The embedding backend failed or returned an unusable response.
    #[error("Embedding service error ({provider}): {message}")]
    EmbeddingServiceError {
        /// The embedding backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation backend failed or returned an unusable response.
    #[error("Generation service error ({provider}): {message}")]
    GenerationServiceError {
        /// The generation backend that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The generation backend did not answer within the caller's timeout.
    #[error("Generation timed out after {timeout:?} ({provider})")]
    GenerationTimeoutError {
        /// The generation backend that timed out.
        provider: String,
        /// The timeout that was exceeded.
        timeout: Duration,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The corpus could not be read or segmented.
    #[error("Corpus error: {0}")]
    CorpusError(String),
}

impl RagError {
    /// Whether a retry could plausibly succeed.
    ///
    /// Only generation failures are considered transient; everything else is
    /// either a configuration problem or belongs to another stage.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::GenerationServiceError { .. } | Self::GenerationTimeoutError { .. })
    }
}

fn passage_suffix(passage_id: &Option<String>) -> String {
    passage_id.as_deref().map(|id| format!(" for passage '{id}'")).unwrap_or_default()
}

/// A convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, RagError>;
