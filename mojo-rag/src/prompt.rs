//! Prompt assembly.
//!
//! [`PromptAssembler`] renders a fixed instruction template with the user's
//! question and the retrieved passage texts. It is pure: no I/O, no clock, no
//! randomness, and no length budget. Truncation, if any, is the generation
//! backend's business.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Placeholder replaced by the user's question.
pub const QUESTION_PLACEHOLDER: &str = "{question}";

/// Placeholder replaced by the joined passage texts.
pub const CONTEXT_PLACEHOLDER: &str = "{context}";

/// Instruction template used by the Mojo chatbot.
pub const DEFAULT_TEMPLATE: &str = "\
You answer questions about a new programming language named \"Mojo\" developed by the company \"Modular\"

Below is the question you've received from someone trying to learn about the language. Please answer the question:
{question}

Here is a list of answers the team have given previously:
{context}
";

/// A fully rendered prompt, ready for a [`Generator`](crate::Generator).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Prompt(String);

impl Prompt {
    /// Wrap already-rendered text.
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// The prompt text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length of the prompt in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the prompt is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consume the prompt and return its text.
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Prompt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Prompt {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Merges a question and retrieved passages into a [`Prompt`].
///
/// # Example
///
/// ```rust,ignore
/// use mojo_rag::PromptAssembler;
///
/// let assembler = PromptAssembler::default();
/// let prompt = assembler.assemble("Who made Mojo?", &["Mojo is a language by Modular."]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptAssembler {
    template: String,
    separator: String,
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self { template: DEFAULT_TEMPLATE.to_string(), separator: "\n".to_string() }
    }
}

impl PromptAssembler {
    /// Use a custom template.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::ConfigError`] unless the template contains
    /// [`QUESTION_PLACEHOLDER`] and [`CONTEXT_PLACEHOLDER`] exactly once each.
    pub fn with_template(template: impl Into<String>) -> Result<Self> {
        let template = template.into();
        for placeholder in [QUESTION_PLACEHOLDER, CONTEXT_PLACEHOLDER] {
            let count = template.matches(placeholder).count();
            if count != 1 {
                return Err(RagError::ConfigError(format!(
                    "prompt template must contain {placeholder} exactly once, found {count}"
                )));
            }
        }
        Ok(Self { template, ..Self::default() })
    }

    /// Set the string placed between consecutive passages. Defaults to `"\n"`.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// The template in use.
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Render the template for `question` and `passages`, preserving passage order.
    ///
    /// Substitution is single-pass: placeholder text appearing inside the
    /// question or a passage is left untouched.
    pub fn assemble<S: AsRef<str>>(&self, question: &str, passages: &[S]) -> Prompt {
        let context =
            passages.iter().map(|p| p.as_ref()).collect::<Vec<&str>>().join(&self.separator);

        let mut rendered =
            String::with_capacity(self.template.len() + question.len() + context.len());
        let mut rest = self.template.as_str();
        while let Some((pos, placeholder)) = next_placeholder(rest) {
            rendered.push_str(&rest[..pos]);
            let value =
                if placeholder == QUESTION_PLACEHOLDER { question } else { context.as_str() };
            rendered.push_str(value);
            rest = &rest[pos + placeholder.len()..];
        }
        rendered.push_str(rest);

        Prompt(rendered)
    }
}

/// Position and text of the earliest placeholder in `text`.
fn next_placeholder(text: &str) -> Option<(usize, &'static str)> {
    [QUESTION_PLACEHOLDER, CONTEXT_PLACEHOLDER]
        .into_iter()
        .filter_map(|p| text.find(p).map(|pos| (pos, p)))
        .min_by_key(|(pos, _)| *pos)
}
