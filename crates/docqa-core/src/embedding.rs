//! Embedder trait and vector utilities.
//!
//! Defines the [`Embedder`] trait every embedding backend implements, plus
//! the pure similarity helpers the vector index ranks with.
//!
//! Concrete embedders (OpenAI-compatible, Ollama, fastembed) live in the
//! `docqa` app crate.

use async_trait::async_trait;

use crate::error::EmbeddingError;

/// Maps text to a fixed-dimension vector.
///
/// The chunks of an index and every query against it must be embedded by
/// the same model at the same dimension; [`Retriever`](crate::retrieve::Retriever)
/// checks [`model_name`](Embedder::model_name) and [`dims`](Embedder::dims)
/// against the index before embedding a query.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Returns the model identifier (e.g. `"embed-mistral"`).
    fn model_name(&self) -> &str;
    /// Returns the embedding vector dimensionality (e.g. `1024`).
    fn dims(&self) -> usize;
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;
}

/// Compute cosine similarity between two embedding vectors.
///
/// Returns a value in `[-1.0, 1.0]`:
/// - `1.0` = identical direction
/// - `0.0` = orthogonal (unrelated)
/// - `-1.0` = opposite direction
///
/// Returns `0.0` for empty vectors, vectors of different lengths, or a
/// zero-magnitude vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f32::EPSILON {
        return 0.0;
    }

    dot / denom
}

/// Euclidean (L2) distance. Vectors of different lengths are `f32::INFINITY` apart.
pub fn l2_distance(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return f32::INFINITY;
    }
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
