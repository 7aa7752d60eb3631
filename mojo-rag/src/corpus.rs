//! Markdown corpus segmentation.
//!
//! The chatbot's knowledge base is a single markdown file of questions and
//! answers. [`MarkdownCorpus`] turns it into [`Passage`]s, one per element:
//! each paragraph under a heading becomes its own passage, with the heading
//! hierarchy (`"Language > Ownership"`) recorded as the passage source.
//! Paragraphs longer than the configured bound are split further by sentence,
//! then by word.

use std::path::Path;

use tracing::{debug, info};

use crate::document::Passage;
use crate::error::{RagError, Result};

/// Separators tried in order when a paragraph is too long.
const SEPARATORS: [&str; 4] = [". ", "! ", "? ", " "];

/// Segments markdown documents into passages.
///
/// Passage IDs are generated as `{document_id}_{element_index}`. Each passage
/// carries `element_index` and `header_path` metadata.
///
/// # Example
///
/// ```rust,ignore
/// use mojo_rag::MarkdownCorpus;
///
/// let corpus = MarkdownCorpus::new(1000);
/// let passages = corpus.load("mojo-team-answers.md").await?;
/// ```
#[derive(Debug, Clone)]
pub struct MarkdownCorpus {
    max_chars: usize,
}

impl Default for MarkdownCorpus {
    fn default() -> Self {
        Self { max_chars: Self::DEFAULT_MAX_CHARS }
    }
}

/// A markdown section with its header hierarchy and body text.
struct MarkdownSection {
    header_path: String,
    body: String,
}

impl MarkdownCorpus {
    /// Default upper bound on passage length, in characters.
    pub const DEFAULT_MAX_CHARS: usize = 1500;

    /// Create a segmenter that keeps passages at or under `max_chars` characters.
    ///
    /// A `max_chars` of zero is treated as one.
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars: max_chars.max(1) }
    }

    /// Read a markdown file and segment it.
    ///
    /// The file stem is used as the document ID.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::CorpusError`] if the file cannot be read.
    pub async fn load(&self, path: impl AsRef<Path>) -> Result<Vec<Passage>> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            RagError::CorpusError(format!("failed to read '{}': {e}", path.display()))
        })?;

        let document_id =
            path.file_stem().and_then(|s| s.to_str()).unwrap_or("corpus").to_string();
        let passages = self.segment(&document_id, &text);
        info!(path = %path.display(), passage_count = passages.len(), "loaded markdown corpus");
        Ok(passages)
    }

    /// Segment markdown text into passages.
    ///
    /// Returns an empty `Vec` when the text has no body content. Headings with
    /// no paragraphs beneath them produce no passages.
    pub fn segment(&self, document_id: &str, text: &str) -> Vec<Passage> {
        let mut passages = Vec::new();

        for section in parse_markdown_sections(text) {
            for paragraph in section.body.split("\n\n").map(str::trim).filter(|p| !p.is_empty()) {
                for piece in split_and_merge(paragraph, self.max_chars, &SEPARATORS) {
                    let element_index = passages.len();
                    let source = if section.header_path.is_empty() {
                        document_id.to_string()
                    } else {
                        section.header_path.clone()
                    };
                    passages.push(
                        Passage::new(format!("{document_id}_{element_index}"), piece, source)
                            .with_metadata("element_index", element_index.to_string())
                            .with_metadata("header_path", section.header_path.clone()),
                    );
                }
            }
        }

        debug!(document_id, passage_count = passages.len(), "segmented markdown");
        passages
    }
}

/// Parse markdown text into sections split by ATX headers.
///
/// Lines inside fenced code blocks are never treated as headers.
fn parse_markdown_sections(text: &str) -> Vec<MarkdownSection> {
    let mut sections = Vec::new();
    let mut headers: Vec<String> = Vec::new();
    let mut current_body = String::new();
    let mut current_header_path = String::new();
    let mut in_fence = false;

    for line in text.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with("```") {
            in_fence = !in_fence;
        }

        let level = trimmed.chars().take_while(|c| *c == '#').count();
        let is_header = !in_fence
            && (1..=6).contains(&level)
            && trimmed[level..].chars().next().is_none_or(char::is_whitespace);

        if is_header {
            if !current_body.trim().is_empty() {
                sections.push(MarkdownSection {
                    header_path: current_header_path.clone(),
                    body: current_body.trim().to_string(),
                });
            }
            current_body.clear();

            headers.truncate(level - 1);
            while headers.len() < level - 1 {
                headers.push(String::new());
            }
            headers.push(trimmed[level..].trim().trim_end_matches('#').trim().to_string());
            current_header_path = headers
                .iter()
                .filter(|h| !h.is_empty())
                .cloned()
                .collect::<Vec<_>>()
                .join(" > ");
        } else {
            if !current_body.is_empty() {
                current_body.push('\n');
            }
            current_body.push_str(line);
        }
    }

    if !current_body.trim().is_empty() {
        sections.push(MarkdownSection {
            header_path: current_header_path,
            body: current_body.trim().to_string(),
        });
    }

    sections
}

/// Split text by a separator, then merge segments into pieces no longer than
/// `max_chars`. Segments that are still too long are split with the next
/// separator, and finally by character count.
fn split_and_merge(text: &str, max_chars: usize, separators: &[&str]) -> Vec<String> {
    if text.chars().count() <= max_chars {
        return vec![text.to_string()];
    }
    let Some((separator, remaining)) = separators.split_first() else {
        return split_by_chars(text, max_chars);
    };

    let mut pieces = Vec::new();
    let mut current = String::new();

    for segment in split_keeping_separator(text, separator) {
        if current.is_empty() {
            current = segment.to_string();
        } else if current.chars().count() + segment.chars().count() <= max_chars {
            current.push_str(segment);
        } else {
            pieces.extend(split_and_merge(current.trim(), max_chars, remaining));
            current = segment.to_string();
        }
    }

    if !current.trim().is_empty() {
        pieces.extend(split_and_merge(current.trim(), max_chars, remaining));
    }

    pieces.retain(|p| !p.is_empty());
    pieces
}

/// Split text at a separator while keeping the separator attached to the preceding segment.
fn split_keeping_separator<'a>(text: &'a str, separator: &str) -> Vec<&'a str> {
    let mut result = Vec::new();
    let mut start = 0;

    while let Some(pos) = text[start..].find(separator) {
        let end = start + pos + separator.len();
        result.push(&text[start..end]);
        start = end;
    }

    if start < text.len() {
        result.push(&text[start..]);
    }

    result
}

/// Split on character boundaries into pieces of at most `max_chars` characters.
fn split_by_chars(text: &str, max_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars.chunks(max_chars).map(|chunk| chunk.iter().collect()).collect()
}
