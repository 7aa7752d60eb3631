//! Offline embedder based on feature-hashed term counts.
//!
//! [`TermHashEmbedder`] needs no network, model file, or API key. It is a
//! lexical embedder: two texts are similar when they share content words. That
//! is enough for tests, demos, and running the chat front end offline.

use async_trait::async_trait;
use tracing::trace;

use crate::document::Embedding;
use crate::embedding::Embedder;
use crate::error::{RagError, Result};

/// English function words that carry no retrieval signal.
const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "are", "as", "at", "be", "but", "by", "can", "do", "does", "for", "from",
    "has", "have", "how", "i", "if", "in", "into", "is", "it", "its", "of", "on", "or", "so",
    "such", "than", "that", "the", "their", "then", "there", "these", "they", "this", "to", "was",
    "were", "what", "when", "where", "which", "who", "whom", "why", "will", "with", "you", "your",
];

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic bag-of-words embedder.
///
/// Text is lower-cased and split on anything that is not alphanumeric; stop
/// words are dropped; each remaining token is hashed (FNV-1a) into one of
/// `dimensions` buckets and counted. The count vector is L2-normalised, so a
/// text with no content words embeds to the zero vector.
///
/// # Example
///
/// ```rust,ignore
/// use mojo_rag::{Embedder, TermHashEmbedder};
///
/// let embedder = TermHashEmbedder::new(256);
/// let a = embedder.embed("Mojo interops with Python.").await?;
/// let b = embedder.embed("Mojo interops with Python.").await?;
/// assert_eq!(a, b);
/// ```
#[derive(Debug, Clone)]
pub struct TermHashEmbedder {
    dimensions: usize,
}

impl TermHashEmbedder {
    /// Default number of hash buckets.
    pub const DEFAULT_DIMENSIONS: usize = 256;

    /// Create an embedder with the given number of buckets.
    ///
    /// # Panics
    ///
    /// Panics if `dimensions` is zero.
    pub fn new(dimensions: usize) -> Self {
        assert!(dimensions > 0, "dimensions must be greater than zero");
        Self { dimensions }
    }

    /// Create an embedder, rejecting a zero dimension with an error instead of a panic.
    pub fn try_new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RagError::ConfigError(
                "term hash embedder needs at least one dimension".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    fn bucket(&self, token: &str) -> usize {
        let hash = token
            .bytes()
            .fold(FNV_OFFSET, |acc, b| (acc ^ u64::from(b)).wrapping_mul(FNV_PRIME));
        (hash % self.dimensions as u64) as usize
    }

    fn vectorize(&self, text: &str) -> Embedding {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in tokenize(text) {
            vector[self.bucket(&token)] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        vector
    }
}

impl Default for TermHashEmbedder {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DIMENSIONS)
    }
}

/// Lower-cased content words of `text`, in order.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .filter(|word| !STOP_WORDS.contains(&word.as_str()))
}

#[async_trait]
impl Embedder for TermHashEmbedder {
    async fn embed(&self, text: &str) -> Result<Embedding> {
        trace!(provider = "TermHash", text_len = text.len(), "embedding single text");
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
