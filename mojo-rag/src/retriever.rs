//! Query-time retrieval: embed the question, then search the store.

use std::sync::Arc;

use tracing::debug;

use crate::config::RagConfig;
use crate::document::RetrievalResult;
use crate::embedding::Embedder;
use crate::error::Result;
use crate::store::DocumentStore;

/// Composes an [`Embedder`] and a [`DocumentStore`] into top-k retrieval.
///
/// Errors from either dependency are returned unchanged.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    store: Arc<DocumentStore>,
    top_k: usize,
    similarity_threshold: Option<f32>,
}

impl Retriever {
    /// Create a retriever returning [`RagConfig::DEFAULT_TOP_K`] passages by default.
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<DocumentStore>) -> Self {
        Self { embedder, store, top_k: RagConfig::DEFAULT_TOP_K, similarity_threshold: None }
    }

    /// Take `top_k` and `similarity_threshold` from `config`.
    pub fn with_config(mut self, config: &RagConfig) -> Self {
        self.top_k = config.top_k;
        self.similarity_threshold = config.similarity_threshold;
        self
    }

    /// The store searched by this retriever.
    pub fn store(&self) -> &Arc<DocumentStore> {
        &self.store
    }

    /// The embedder used for queries.
    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    /// Default number of passages returned by [`retrieve_default`](Self::retrieve_default).
    pub fn top_k(&self) -> usize {
        self.top_k
    }

    /// Retrieve the configured number of passages for `query`.
    pub async fn retrieve_default(&self, query: &str) -> Result<RetrievalResult> {
        self.retrieve(query, self.top_k).await
    }

    /// Retrieve up to `k` passages for `query`, most similar first.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmbeddingServiceError`](crate::RagError::EmbeddingServiceError)
    ///   from the embedder.
    /// - [`RagError::InvalidKError`](crate::RagError::InvalidKError) or
    ///   [`RagError::DimensionMismatchError`](crate::RagError::DimensionMismatchError)
    ///   from the store.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<RetrievalResult> {
        let query_embedding = self.embedder.embed(query).await?;
        self.search_embedded(&query_embedding, k)
    }

    /// Search with an already computed query embedding, applying the
    /// similarity threshold if one is configured.
    pub fn search_embedded(&self, query_embedding: &[f32], k: usize) -> Result<RetrievalResult> {
        let mut result = self.store.search(query_embedding, k)?;

        if let Some(threshold) = self.similarity_threshold {
            result.retain_above(threshold);
        }

        debug!(k, hit_count = result.len(), "retrieved passages");
        Ok(result)
    }
}

impl std::fmt::Debug for Retriever {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retriever")
            .field("store_len", &self.store.len())
            .field("dimensions", &self.embedder.dimensions())
            .field("top_k", &self.top_k)
            .field("similarity_threshold", &self.similarity_threshold)
            .finish()
    }
}
