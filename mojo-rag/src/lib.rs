//! # mojo-rag
//!
//! Retrieval-augmented question answering over a fixed corpus.
//!
//! ## Overview
//!
//! A corpus of [`Passage`]s is embedded once into an immutable
//! [`DocumentStore`]. Each question is embedded, matched against the store by
//! cosine similarity, merged with the top passages into a [`Prompt`], and sent
//! to a [`Generator`]:
//!
//! - [`Embedder`] - text to fixed-length vectors ([`TermHashEmbedder`] offline,
//!   [`openai::OpenAIEmbedder`] hosted)
//! - [`DocumentStore`] - top-k cosine search with ingestion-order tie-breaks
//! - [`Retriever`] - embed then search
//! - [`PromptAssembler`] - pure template rendering
//! - [`Generator`] / [`GeneratorClient`] - completion backends with optional
//!   timeout and retry
//! - [`AnswerPipeline`] - the `answer(query)` entry point
//! - [`MarkdownCorpus`] - markdown file to passages
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use mojo_rag::{AnswerPipeline, MarkdownCorpus, TermHashEmbedder};
//!
//! let passages = MarkdownCorpus::default().load("mojo-team-answers.md").await?;
//! let pipeline = AnswerPipeline::builder()
//!     .embedder(Arc::new(TermHashEmbedder::default()))
//!     .generator(Arc::new(my_generator))
//!     .passages(passages)
//!     .build()
//!     .await?;
//!
//! println!("{}", pipeline.answer("Who made Mojo?").await?);
//! ```
//!
//! ## Features
//!
//! - `openai` (default) - OpenAI-compatible embedding and chat backends

pub mod config;
pub mod corpus;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generator;
pub mod hashing;
#[cfg(feature = "openai")]
pub mod openai;
pub mod pipeline;
pub mod prompt;
pub mod retriever;
pub mod store;

pub use config::{RagConfig, RagConfigBuilder, RetryPolicy};
pub use corpus::MarkdownCorpus;
pub use document::{Embedding, Passage, RetrievalResult, ScoredPassage};
pub use embedding::Embedder;
pub use error::{RagError, Result};
pub use generator::{Generator, GeneratorClient};
pub use hashing::TermHashEmbedder;
pub use pipeline::{Answer, AnswerPipeline, AnswerPipelineBuilder, QueryStage};
pub use prompt::{DEFAULT_TEMPLATE, Prompt, PromptAssembler};
pub use retriever::Retriever;
pub use store::DocumentStore;
