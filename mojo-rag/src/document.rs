//! Data types for passages, embeddings, and retrieval results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// A fixed-length vector representation of a passage or query.
pub type Embedding = Vec<f32>;

/// A unit of retrievable text.
///
/// Passages are immutable once ingested into a
/// [`DocumentStore`](crate::DocumentStore).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Passage {
    /// Stable identifier, unique within one corpus.
    pub id: String,
    /// The raw text content.
    pub text: String,
    /// Where the passage came from, e.g. the heading path of its section.
    pub source: String,
    /// Key-value metadata recorded by the loader.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

impl Passage {
    /// Create a passage with no metadata.
    pub fn new(id: impl Into<String>, text: impl Into<String>, source: impl Into<String>) -> Self {
        Self { id: id.into(), text: text.into(), source: source.into(), metadata: HashMap::new() }
    }

    /// Attach a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// A retrieved [`Passage`] paired with its similarity to the query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredPassage {
    /// The retrieved passage.
    pub passage: Passage,
    /// Cosine similarity to the query (higher is more relevant).
    pub score: f32,
}

/// Passages ranked by descending similarity to a query.
///
/// Holds at most `k` entries; never more than the store contains.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RetrievalResult {
    hits: Vec<ScoredPassage>,
}

impl RetrievalResult {
    pub(crate) fn new(hits: Vec<ScoredPassage>) -> Self {
        Self { hits }
    }

    /// Number of retrieved passages.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// Whether nothing was retrieved.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    /// The scored hits, best first.
    pub fn hits(&self) -> &[ScoredPassage] {
        &self.hits
    }

    /// The best-ranked passage, if any.
    pub fn top(&self) -> Option<&Passage> {
        self.hits.first().map(|hit| &hit.passage)
    }

    /// The passages, best first.
    pub fn passages(&self) -> impl Iterator<Item = &Passage> {
        self.hits.iter().map(|hit| &hit.passage)
    }

    /// The passage texts, best first, ready for prompt assembly.
    pub fn texts(&self) -> Vec<&str> {
        self.hits.iter().map(|hit| hit.passage.text.as_str()).collect()
    }

    /// Keep only hits scoring at least `threshold`.
    pub(crate) fn retain_above(&mut self, threshold: f32) {
        self.hits.retain(|hit| hit.score >= threshold);
    }
}

impl IntoIterator for RetrievalResult {
    type Item = ScoredPassage;
    type IntoIter = std::vec::IntoIter<ScoredPassage>;

    fn into_iter(self) -> Self::IntoIter {
        self.hits.into_iter()
    }
}
