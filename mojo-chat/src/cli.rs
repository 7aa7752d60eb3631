//! Command-line arguments.
//!
//! Every flag can also be set through a `MOJO_CHAT_*` environment variable,
//! which makes a `.env` file next to the binary enough to configure a run.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use mojo_rag::openai::{DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL};
use mojo_rag::{RagConfig, RetryPolicy};

/// Delay before the first generation retry.
const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Answer questions about the Mojo language from previous team answers
#[derive(Parser, Debug, Clone)]
#[command(name = "mojo-chat", long_about = None)]
#[command(version)]
pub struct Args {
    /// Markdown file with the team's previous answers
    #[arg(short, long, env = "MOJO_CHAT_CORPUS")]
    pub corpus: PathBuf,

    /// Ask a single question and exit instead of starting the interactive prompt
    #[arg(short, long, env = "MOJO_CHAT_QUESTION")]
    pub question: Option<String>,

    /// Number of previous answers passed to the model
    #[arg(short = 'k', long, env = "MOJO_CHAT_TOP_K", default_value_t = RagConfig::DEFAULT_TOP_K)]
    pub top_k: usize,

    /// Chat completion model
    #[arg(short, long, env = "MOJO_CHAT_MODEL", default_value = DEFAULT_CHAT_MODEL)]
    pub model: String,

    /// Embedding model
    #[arg(long, env = "MOJO_CHAT_EMBEDDING_MODEL", default_value = DEFAULT_EMBEDDING_MODEL)]
    pub embedding_model: String,

    /// Output dimension of the embedding model, if it is not the ada-002 default
    #[arg(long, env = "MOJO_CHAT_EMBEDDING_DIMENSIONS")]
    pub embedding_dimensions: Option<usize>,

    /// Sampling temperature
    #[arg(short, long, env = "MOJO_CHAT_TEMPERATURE", default_value_t = 0.0)]
    pub temperature: f32,

    /// Give up on a generation attempt after this many seconds
    #[arg(long, env = "MOJO_CHAT_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Retry a failed generation this many times
    #[arg(long, env = "MOJO_CHAT_MAX_RETRIES", default_value_t = 0)]
    pub max_retries: u32,

    /// Answer from the corpus alone: embed locally and print the matching answers
    #[arg(long, env = "MOJO_CHAT_OFFLINE")]
    pub offline: bool,
}

impl Args {
    /// The retry policy implied by `--max-retries`.
    pub fn retry_policy(&self) -> RetryPolicy {
        if self.max_retries == 0 {
            RetryPolicy::none()
        } else {
            RetryPolicy::exponential(self.max_retries.saturating_add(1), RETRY_BACKOFF)
        }
    }

    /// Build a validated pipeline configuration from the arguments.
    pub fn rag_config(&self) -> mojo_rag::Result<RagConfig> {
        let mut builder = RagConfig::builder().top_k(self.top_k).retry(self.retry_policy());
        if let Some(secs) = self.timeout_secs {
            builder = builder.generation_timeout(Duration::from_secs(secs));
        }
        builder.build()
    }
}
