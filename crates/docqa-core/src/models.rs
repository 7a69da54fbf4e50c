//! Core data models that flow through the pipeline.
//!
//! A [`Document`] is split into [`Chunk`]s, the chunks are embedded into a
//! [`VectorIndex`](crate::index::VectorIndex), and every query produces an
//! [`Answer`] carrying the chunks it was grounded on.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A loaded document. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    /// URL or path the document was loaded from.
    pub source: String,
    /// Extracted plain text.
    pub text: String,
    /// MIME type the text was extracted from (e.g. `application/pdf`).
    pub content_type: String,
    /// When the loader fetched the bytes.
    pub fetched_at: DateTime<Utc>,
}

impl Document {
    pub fn new(source: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            text: text.into(),
            content_type: "text/plain".to_string(),
            fetched_at: Utc::now(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = content_type.into();
        self
    }

    /// Length of the text in characters (not bytes).
    pub fn char_len(&self) -> usize {
        self.text.chars().count()
    }
}

/// A window of a document's text.
///
/// `start` and `end` are character offsets into [`Document::text`], so
/// `end - start` is the chunk length in characters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Position in the split, contiguous from 0.
    pub index: usize,
    /// Inclusive start offset, in characters.
    pub start: usize,
    /// Exclusive end offset, in characters.
    pub end: usize,
    pub text: String,
    /// SHA-256 of `text`, lowercase hex.
    pub hash: String,
}

impl Chunk {
    pub fn char_len(&self) -> usize {
        self.end - self.start
    }
}

/// A generated answer plus the chunks it was grounded on.
#[derive(Debug, Clone, Serialize)]
pub struct Answer {
    /// Text returned by the language model.
    pub text: String,
    /// Retrieved chunks in rank order (best first).
    pub context: Vec<Chunk>,
    /// How many of `context` fit into the bounded context block.
    pub context_chunks_used: usize,
}
