//! Fixed-window text chunker with overlap.
//!
//! Splits a [`Document`]'s text into [`Chunk`]s of `chunk_size` characters,
//! each sharing exactly `overlap` characters with its predecessor. Sizes and
//! offsets are measured in characters, so a split never lands inside a
//! multi-byte UTF-8 sequence.
//!
//! # Algorithm
//!
//! 1. Reject `overlap >= chunk_size` with [`RagError::InvalidConfiguration`].
//! 2. Start a window at offset 0 and take up to `chunk_size` characters.
//! 3. Advance the window start by `chunk_size - overlap`.
//! 4. Stop after the first window that reaches the end of the text; that
//!    window may be shorter than `chunk_size`.
//!
//! # Example
//!
//! ```rust
//! use docqa_core::chunk::{split, ChunkingParams};
//! use docqa_core::models::Document;
//!
//! let doc = Document::new("mem://lorem", "x".repeat(2400));
//! let chunks = split(&doc, &ChunkingParams::new(1000, 200).unwrap()).unwrap();
//! let bounds: Vec<_> = chunks.iter().map(|c| (c.start, c.end)).collect();
//! assert_eq!(bounds, vec![(0, 1000), (800, 1800), (1600, 2400)]);
//! ```

use sha2::{Digest, Sha256};

use crate::error::{RagError, Result};
use crate::models::{Chunk, Document};

/// Default window size, in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between neighbouring windows.
pub const DEFAULT_OVERLAP: usize = 200;

/// Validated chunking parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkingParams {
    chunk_size: usize,
    overlap: usize,
}

impl ChunkingParams {
    /// # Errors
    ///
    /// Returns [`RagError::InvalidConfiguration`] if `overlap >= chunk_size`
    /// (this also rejects `chunk_size == 0`).
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if overlap >= chunk_size {
            return Err(RagError::InvalidConfiguration(format!(
                "overlap ({overlap}) must be less than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Distance between consecutive window starts. Always >= 1.
    pub fn stride(&self) -> usize {
        self.chunk_size - self.overlap
    }
}

impl Default for ChunkingParams {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            overlap: DEFAULT_OVERLAP,
        }
    }
}

/// Split a document into overlapping fixed-size chunks.
///
/// # Guarantees
///
/// - Chunks cover the text start-to-end with no gaps.
/// - `chunks[i + 1].start == chunks[i].start + stride`, so neighbours share
///   exactly `overlap` characters.
/// - Only the final chunk may be shorter than `chunk_size`.
/// - Empty text yields no chunks.
pub fn split(document: &Document, params: &ChunkingParams) -> Result<Vec<Chunk>> {
    // Byte offset of every char, plus the end of the text, so char offsets
    // map straight onto slice bounds.
    let boundaries: Vec<usize> = document
        .text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(document.text.len()))
        .collect();
    let total = boundaries.len() - 1;

    let mut chunks = Vec::with_capacity(total / params.stride() + 1);
    let mut start = 0;
    while start < total {
        let end = (start + params.chunk_size).min(total);
        let text = &document.text[boundaries[start]..boundaries[end]];
        chunks.push(make_chunk(chunks.len(), start, end, text));
        if end == total {
            break;
        }
        start += params.stride();
    }

    Ok(chunks)
}

/// Rebuild the source text from the non-overlapping portion of each chunk.
///
/// The inverse of [`split`] for chunks produced with the same `overlap`.
pub fn reconstruct(chunks: &[Chunk], overlap: usize) -> String {
    let mut out = String::new();
    for (i, chunk) in chunks.iter().enumerate() {
        if i == 0 {
            out.push_str(&chunk.text);
        } else {
            out.extend(chunk.text.chars().skip(overlap));
        }
    }
    out
}

fn make_chunk(index: usize, start: usize, end: usize, text: &str) -> Chunk {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    Chunk {
        index,
        start,
        end,
        text: text.to_string(),
        hash,
    }
}
