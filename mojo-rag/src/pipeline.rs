//! Answer pipeline orchestrator.
//!
//! The [`AnswerPipeline`] is the single entry point a front end needs: it owns
//! the immutable [`DocumentStore`] and runs each question through
//! embed → search → assemble → generate.
//!
//! # Example
//!
//! ```rust,ignore
//! use mojo_rag::{AnswerPipeline, RagConfig, TermHashEmbedder};
//!
//! let pipeline = AnswerPipeline::builder()
//!     .config(RagConfig::default())
//!     .embedder(Arc::new(TermHashEmbedder::default()))
//!     .generator(Arc::new(my_generator))
//!     .passages(passages)
//!     .build()
//!     .await?;
//!
//! let answer = pipeline.answer("Who made Mojo?").await?;
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::RagConfig;
use crate::document::{Passage, RetrievalResult};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::generator::{Generator, GeneratorClient};
use crate::prompt::{Prompt, PromptAssembler};
use crate::retriever::Retriever;
use crate::store::DocumentStore;

/// Where a question is in its lifecycle.
///
/// Stages run strictly in declaration order; a failure in any stage moves the
/// question straight to [`Failed`](QueryStage::Failed) with no partial result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStage {
    Idle,
    Embedding,
    Searching,
    Assembling,
    Generating,
    Done,
    Failed,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Embedding => "embedding",
            Self::Searching => "searching",
            Self::Assembling => "assembling",
            Self::Generating => "generating",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// A generated answer together with what produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// The generated text.
    pub text: String,
    /// The passages the answer was grounded on, best first.
    pub context: RetrievalResult,
    /// The exact prompt sent to the generator.
    pub prompt: Prompt,
}

/// The retrieval-augmented answer pipeline.
///
/// Read-only after construction, so one instance can serve concurrent
/// questions from many tasks. Construct one via [`AnswerPipeline::builder()`].
pub struct AnswerPipeline {
    config: RagConfig,
    retriever: Retriever,
    assembler: PromptAssembler,
    generator: GeneratorClient,
}

impl AnswerPipeline {
    /// Create a new [`AnswerPipelineBuilder`].
    pub fn builder() -> AnswerPipelineBuilder {
        AnswerPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the retriever.
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Return a reference to the document store.
    pub fn store(&self) -> &Arc<DocumentStore> {
        self.retriever.store()
    }

    /// Return a reference to the prompt assembler.
    pub fn assembler(&self) -> &PromptAssembler {
        &self.assembler
    }

    /// Answer a question.
    ///
    /// # Errors
    ///
    /// Any error raised by the embedder, store, or generator, unchanged.
    pub async fn answer(&self, query: &str) -> Result<String> {
        self.answer_with_context(query).await.map(|answer| answer.text)
    }

    /// Answer a question and return the retrieved passages and prompt with it.
    ///
    /// # Errors
    ///
    /// Any error raised by the embedder, store, or generator, unchanged.
    pub async fn answer_with_context(&self, query: &str) -> Result<Answer> {
        let started = Instant::now();
        let mut stage = QueryStage::Idle;

        let result = self.run(query, &mut stage).await;
        match &result {
            Ok(answer) => info!(
                stage = %QueryStage::Done,
                context_count = answer.context.len(),
                answer_len = answer.text.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "answered question"
            ),
            Err(e) => error!(
                stage = %QueryStage::Failed,
                failed_stage = %stage,
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "question failed"
            ),
        }
        result
    }

    async fn run(&self, query: &str, stage: &mut QueryStage) -> Result<Answer> {
        *stage = QueryStage::Embedding;
        debug!(stage = %stage, query_len = query.len());
        let query_embedding = self.retriever.embedder().embed(query).await?;

        *stage = QueryStage::Searching;
        debug!(stage = %stage, top_k = self.config.top_k);
        let context = self.retriever.search_embedded(&query_embedding, self.config.top_k)?;

        *stage = QueryStage::Assembling;
        debug!(stage = %stage, context_count = context.len());
        let prompt = self.assembler.assemble(query, &context.texts());

        *stage = QueryStage::Generating;
        debug!(stage = %stage, prompt_len = prompt.len());
        let text = self.generator.generate(&prompt).await?;

        *stage = QueryStage::Done;
        Ok(Answer { text, context, prompt })
    }
}

impl fmt::Debug for AnswerPipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnswerPipeline")
            .field("config", &self.config)
            .field("retriever", &self.retriever)
            .field("generator", &self.generator)
            .finish()
    }
}

/// Builder for constructing an [`AnswerPipeline`].
///
/// `embedder`, `generator`, and either `passages` or `store` are required.
/// `config` and `assembler` fall back to their defaults. Building embeds the
/// passages, so [`build()`](AnswerPipelineBuilder::build) is async.
///
/// # Example
///
/// ```rust,ignore
/// let pipeline = AnswerPipeline::builder()
///     .embedder(Arc::new(embedder))
///     .generator(Arc::new(generator))
///     .passages(passages)
///     .assembler(PromptAssembler::with_template(template)?) // optional
///     .build()
///     .await?;
/// ```
#[derive(Default)]
pub struct AnswerPipelineBuilder {
    config: Option<RagConfig>,
    embedder: Option<Arc<dyn Embedder>>,
    generator: Option<Arc<dyn Generator>>,
    passages: Option<Vec<Passage>>,
    store: Option<Arc<DocumentStore>>,
    assembler: Option<PromptAssembler>,
}

impl AnswerPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedder used for passages and questions.
    pub fn embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the generation backend.
    pub fn generator(mut self, generator: Arc<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the corpus to embed into a new store.
    pub fn passages(mut self, passages: Vec<Passage>) -> Self {
        self.passages = Some(passages);
        self
    }

    /// Use an already built store instead of embedding passages.
    pub fn store(mut self, store: Arc<DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set a custom prompt assembler.
    pub fn assembler(mut self, assembler: PromptAssembler) -> Self {
        self.assembler = Some(assembler);
        self
    }

    /// Build the [`AnswerPipeline`].
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidKError`] or [`RagError::ConfigError`] if the config
    ///   fails [`RagConfig::validate`].
    /// - [`RagError::ConfigError`] if a required field is missing, both
    ///   `passages` and `store` are set, or a prebuilt store's dimension
    ///   disagrees with the embedder.
    /// - [`RagError::EmptyCorpusError`], [`RagError::DimensionMismatchError`],
    ///   or [`RagError::EmbeddingServiceError`] from building the store.
    pub async fn build(self) -> Result<AnswerPipeline> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let embedder = self
            .embedder
            .ok_or_else(|| RagError::ConfigError("embedder is required".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| RagError::ConfigError("generator is required".to_string()))?;

        let store = match (self.store, self.passages) {
            (Some(_), Some(_)) => {
                return Err(RagError::ConfigError(
                    "set either passages or store, not both".to_string(),
                ));
            }
            (Some(store), None) => {
                if store.dimensions() != embedder.dimensions() {
                    return Err(RagError::ConfigError(format!(
                        "store dimension ({}) does not match embedder dimension ({})",
                        store.dimensions(),
                        embedder.dimensions()
                    )));
                }
                store
            }
            (None, Some(passages)) => Arc::new(DocumentStore::build(passages, &*embedder).await?),
            (None, None) => {
                return Err(RagError::ConfigError("passages or store is required".to_string()));
            }
        };

        let generator = GeneratorClient::new(generator)
            .with_optional_timeout(config.generation_timeout)
            .with_retry(config.retry);
        let retriever = Retriever::new(embedder, store).with_config(&config);

        info!(
            passage_count = retriever.store().len(),
            top_k = config.top_k,
            generator = generator.name(),
            "answer pipeline ready"
        );

        Ok(AnswerPipeline {
            config,
            retriever,
            assembler: self.assembler.unwrap_or_default(),
            generator,
        })
    }
}
