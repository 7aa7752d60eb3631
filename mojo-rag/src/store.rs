//! Immutable in-memory document store with cosine-similarity search.
//!
//! A [`DocumentStore`] is built once from a corpus and never mutated
//! afterwards, so it can be wrapped in an `Arc` and searched from any number
//! of tasks without locking.

use tracing::{debug, info};

use crate::document::{Embedding, Passage, RetrievalResult, ScoredPassage};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};

/// An ordered collection of `(Passage, Embedding)` pairs.
///
/// Every stored embedding has the same dimension; [`build`](DocumentStore::build)
/// and [`from_embedded`](DocumentStore::from_embedded) reject anything else.
/// Search ranks by descending cosine similarity and breaks ties by ingestion
/// order.
///
/// # Example
///
/// ```rust,ignore
/// use mojo_rag::{DocumentStore, Passage, TermHashEmbedder, Embedder};
///
/// let embedder = TermHashEmbedder::default();
/// let store = DocumentStore::build(passages, &embedder).await?;
/// let query = embedder.embed("Who made Mojo?").await?;
/// let result = store.search(&query, 3)?;
/// ```
#[derive(Debug, Clone)]
pub struct DocumentStore {
    entries: Vec<(Passage, Embedding)>,
    dimensions: usize,
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Make a similarity usable as a total-order sort key.
///
/// NaN (from non-finite embeddings) ranks below every real score, and `-0.0`
/// is folded into `0.0` so the two tie.
fn rank_score(score: f32) -> f32 {
    if score.is_nan() { f32::NEG_INFINITY } else { score + 0.0 }
}

impl DocumentStore {
    /// Embed every passage and build a store from the results.
    ///
    /// Passages are embedded in one batch, in the given order, which becomes
    /// the ingestion order used for tie-breaking.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyCorpusError`] if `passages` is empty.
    /// - [`RagError::DimensionMismatchError`] if any embedding's length differs
    ///   from `embedder.dimensions()`.
    /// - [`RagError::EmbeddingServiceError`] propagated from the embedder,
    ///   including a batch that returns the wrong number of vectors.
    pub async fn build(passages: Vec<Passage>, embedder: &dyn Embedder) -> Result<Self> {
        if passages.is_empty() {
            return Err(RagError::EmptyCorpusError);
        }

        let texts: Vec<&str> = passages.iter().map(|p| p.text.as_str()).collect();
        let embeddings = embedder.embed_batch(&texts).await?;
        if embeddings.len() != passages.len() {
            return Err(RagError::EmbeddingServiceError {
                provider: "batch".to_string(),
                message: format!(
                    "expected {} embeddings, received {}",
                    passages.len(),
                    embeddings.len()
                ),
            });
        }

        let store = Self::with_dimensions(
            passages.into_iter().zip(embeddings).collect(),
            embedder.dimensions(),
        )?;
        info!(passage_count = store.len(), dimensions = store.dimensions, "built document store");
        Ok(store)
    }

    /// Build a store from passages whose embeddings were computed elsewhere.
    ///
    /// The store dimension is taken from the first embedding.
    ///
    /// # Errors
    ///
    /// - [`RagError::EmptyCorpusError`] if `entries` is empty.
    /// - [`RagError::DimensionMismatchError`] if the embeddings disagree in length.
    pub fn from_embedded(entries: Vec<(Passage, Embedding)>) -> Result<Self> {
        let dimensions = entries.first().map(|(_, e)| e.len()).ok_or(RagError::EmptyCorpusError)?;
        Self::with_dimensions(entries, dimensions)
    }

    fn with_dimensions(entries: Vec<(Passage, Embedding)>, dimensions: usize) -> Result<Self> {
        if entries.is_empty() {
            return Err(RagError::EmptyCorpusError);
        }
        if let Some((passage, embedding)) = entries.iter().find(|(_, e)| e.len() != dimensions) {
            return Err(RagError::DimensionMismatchError {
                expected: dimensions,
                actual: embedding.len(),
                passage_id: Some(passage.id.clone()),
            });
        }
        Ok(Self { entries, dimensions })
    }

    /// Return the `k` passages most similar to `query_embedding`.
    ///
    /// The result never holds more passages than the store does, and equal
    /// scores keep their ingestion order.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidKError`] if `k == 0`.
    /// - [`RagError::DimensionMismatchError`] if the query embedding has the
    ///   wrong dimension.
    pub fn search(&self, query_embedding: &[f32], k: usize) -> Result<RetrievalResult> {
        if k == 0 {
            return Err(RagError::InvalidKError { k });
        }
        if query_embedding.len() != self.dimensions {
            return Err(RagError::DimensionMismatchError {
                expected: self.dimensions,
                actual: query_embedding.len(),
                passage_id: None,
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(index, (_, embedding))| {
                (index, rank_score(cosine_similarity(embedding, query_embedding)))
            })
            .collect();

        // sort_by is stable, so equal scores stay in ingestion order.
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);

        let hits = scored
            .into_iter()
            .map(|(index, score)| ScoredPassage { passage: self.entries[index].0.clone(), score })
            .collect::<Vec<_>>();

        debug!(k, hit_count = hits.len(), "searched document store");
        Ok(RetrievalResult::new(hits))
    }

    /// Number of stored passages.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false` for a successfully built store.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Dimension shared by every stored embedding.
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// The stored passages in ingestion order.
    pub fn passages(&self) -> impl Iterator<Item = &Passage> {
        self.entries.iter().map(|(passage, _)| passage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn passage(id: &str) -> Passage {
        Passage::new(id, format!("text of {id}"), "test")
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
        assert!((cosine_similarity(&[1.0, 1.0], &[2.0, 2.0]) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn from_embedded_rejects_ragged_dimensions() {
        let err = DocumentStore::from_embedded(vec![
            (passage("a"), vec![1.0, 0.0]),
            (passage("b"), vec![1.0, 0.0, 0.0]),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            RagError::DimensionMismatchError { expected: 2, actual: 3, passage_id: Some(ref id) }
                if id == "b"
        ));
    }

    #[test]
    fn ties_keep_ingestion_order() {
        let store = DocumentStore::from_embedded(vec![
            (passage("first"), vec![1.0, 0.0]),
            (passage("second"), vec![1.0, 0.0]),
            (passage("third"), vec![0.0, 1.0]),
        ])
        .unwrap();

        let result = store.search(&[1.0, 0.0], 3).unwrap();
        let ids: Vec<&str> = result.passages().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn query_dimension_is_checked() {
        let store = DocumentStore::from_embedded(vec![(passage("a"), vec![1.0, 0.0])]).unwrap();
        assert!(matches!(
            store.search(&[1.0], 1),
            Err(RagError::DimensionMismatchError { expected: 2, actual: 1, passage_id: None })
        ));
    }
}
