//! Embedder trait for turning text into vector embeddings.

use async_trait::async_trait;

use crate::document::Embedding;
use crate::error::Result;

/// Converts text into a fixed-length [`Embedding`].
///
/// Implementations must be deterministic for a given input within one
/// process and must always produce vectors of [`dimensions`](Embedder::dimensions)
/// length. The [`DocumentStore`](crate::DocumentStore) enforces the latter and
/// fails fast when a backend breaks it.
///
/// The default [`embed_batch`](Embedder::embed_batch) calls
/// [`embed`](Embedder::embed) sequentially; backends with native batching
/// should override it.
///
/// # Example
///
/// ```rust,ignore
/// use mojo_rag::{Embedder, TermHashEmbedder};
///
/// let embedder = TermHashEmbedder::new(256);
/// let embedding = embedder.embed("Who made Mojo?").await?;
/// assert_eq!(embedding.len(), embedder.dimensions());
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Generate an embedding for a single text.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::EmbeddingServiceError`](crate::RagError::EmbeddingServiceError)
    /// if the underlying embedding computation is unavailable.
    async fn embed(&self, text: &str) -> Result<Embedding>;

    /// Generate embeddings for a batch of texts, in input order.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }

    /// The dimension of every embedding this instance produces.
    fn dimensions(&self) -> usize;
}
