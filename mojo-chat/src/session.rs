//! Turning a question into printable output.

use std::fmt::Write as _;
use std::sync::Arc;

use anyhow::Context;
use mojo_rag::openai::{OpenAIChatGenerator, OpenAIConfig, OpenAIEmbedder};
use mojo_rag::{
    AnswerPipeline, DocumentStore, Embedder, MarkdownCorpus, RetrievalResult, Retriever,
    TermHashEmbedder,
};
use tracing::info;

use crate::cli::Args;

/// A loaded corpus ready to respond to questions.
#[derive(Debug)]
pub enum ChatSession {
    /// Full retrieval-augmented generation through the OpenAI API.
    Generate(AnswerPipeline),
    /// Local embedding and retrieval only. No API key needed.
    Retrieve(Retriever),
}

impl ChatSession {
    /// Load the corpus named in `args` and set up the matching session.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid, the corpus cannot be read or is
    /// empty, `OPENAI_API_KEY` is missing outside offline mode, or embedding
    /// the corpus fails.
    pub async fn from_args(args: &Args) -> anyhow::Result<Self> {
        let config = args.rag_config().context("invalid configuration")?;
        let passages = MarkdownCorpus::default()
            .load(&args.corpus)
            .await
            .with_context(|| format!("failed to load corpus {}", args.corpus.display()))?;

        if args.offline {
            info!(passage_count = passages.len(), "starting offline session");
            let embedder: Arc<dyn Embedder> = Arc::new(TermHashEmbedder::default());
            let store = DocumentStore::build(passages, &*embedder).await?;
            let retriever = Retriever::new(embedder, Arc::new(store)).with_config(&config);
            return Ok(Self::Retrieve(retriever));
        }

        let openai = OpenAIConfig::from_env()?;
        let mut embedder = OpenAIEmbedder::new(openai.clone()).with_model(&args.embedding_model);
        if let Some(dimensions) = args.embedding_dimensions {
            embedder = embedder.with_dimensions(dimensions);
        }
        let generator = OpenAIChatGenerator::new(openai)
            .with_model(&args.model)
            .with_temperature(args.temperature);

        info!(
            passage_count = passages.len(),
            model = %args.model,
            embedding_model = %args.embedding_model,
            "embedding corpus"
        );
        let pipeline = AnswerPipeline::builder()
            .config(config)
            .embedder(Arc::new(embedder))
            .generator(Arc::new(generator))
            .passages(passages)
            .build()
            .await
            .context("failed to build answer pipeline")?;
        Ok(Self::Generate(pipeline))
    }

    /// Respond to one question.
    ///
    /// Errors are the pipeline's own, so the caller decides how to show them.
    pub async fn respond(&self, question: &str) -> mojo_rag::Result<String> {
        match self {
            Self::Generate(pipeline) => pipeline.answer(question).await,
            Self::Retrieve(retriever) => {
                retriever.retrieve_default(question).await.map(|result| format_matches(&result))
            }
        }
    }
}

/// Render retrieved passages as a numbered list, best match first.
pub fn format_matches(result: &RetrievalResult) -> String {
    if result.is_empty() {
        return "No previous answers match this question.".to_string();
    }

    let mut out = String::new();
    for (rank, hit) in result.hits().iter().enumerate() {
        if rank > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "{}. [{:.3}] {}", rank + 1, hit.score, hit.passage.source);
        let _ = writeln!(out, "   {}", hit.passage.text.replace('\n', "\n   "));
    }
    out.truncate(out.trim_end().len());
    out
}
