//! In-memory vector index.
//!
//! [`VectorIndex`] holds `(Chunk, embedding)` pairs in insertion order and
//! answers top-K similarity queries by brute-force scan. It is built once
//! from all chunks of a document and is immutable afterwards: queries take
//! `&self`, so any number of them can run against a built index without
//! locking.
//!
//! # Ranking
//!
//! | Metric | Score | Best first |
//! |--------|-------|------------|
//! | [`DistanceMetric::Cosine`] | cosine similarity in `[-1, 1]` | highest |
//! | [`DistanceMetric::L2`] | Euclidean distance | lowest |
//!
//! Ties keep insertion order (the sort is stable).

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::embedding::{cosine_similarity, l2_distance, Embedder};
use crate::error::{EmbeddingError, RagError, Result};
use crate::models::{Chunk, Document};

/// How query vectors are compared with stored embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    L2,
}

impl DistanceMetric {
    pub fn score(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => cosine_similarity(a, b),
            DistanceMetric::L2 => l2_distance(a, b),
        }
    }

    /// Orders two scores so that the better one sorts first.
    ///
    /// A total order: NaN ranks after every number, and `-0.0` ties `0.0`.
    pub fn rank(&self, a: f32, b: f32) -> Ordering {
        let (a, b) = (self.rank_key(a), self.rank_key(b));
        match self {
            DistanceMetric::Cosine => b.total_cmp(&a),
            DistanceMetric::L2 => a.total_cmp(&b),
        }
    }

    fn rank_key(&self, score: f32) -> f32 {
        if score.is_nan() {
            match self {
                DistanceMetric::Cosine => f32::NEG_INFINITY,
                DistanceMetric::L2 => f32::INFINITY,
            }
        } else {
            // Folds -0.0 into 0.0.
            score + 0.0
        }
    }
}

impl FromStr for DistanceMetric {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "cosine" => Ok(DistanceMetric::Cosine),
            "l2" => Ok(DistanceMetric::L2),
            other => Err(format!(
                "unknown distance metric '{other}'. Must be cosine or l2."
            )),
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DistanceMetric::Cosine => f.write_str("cosine"),
            DistanceMetric::L2 => f.write_str("l2"),
        }
    }
}

/// Receives progress while a document is split and indexed.
pub trait BuildProgress: Send + Sync {
    /// Called once `document` has been split into `chunks` chunks.
    fn chunked(&self, _document: &Document, _chunks: usize) {}

    /// Called after each chunk is embedded, with `n` of `total` done.
    fn embedded(&self, n: usize, total: usize);
}

/// No-op progress.
impl BuildProgress for () {
    fn embedded(&self, _n: usize, _total: usize) {}
}

/// A stored chunk and its embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexEntry {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

/// A query hit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredChunk {
    pub chunk: Chunk,
    /// Similarity or distance, depending on the index metric.
    pub score: f32,
}

/// Insertion-ordered `(Chunk, embedding)` pairs plus the identity of the
/// embedder that produced them.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    model: String,
    dims: usize,
    metric: DistanceMetric,
    entries: Vec<IndexEntry>,
}

impl VectorIndex {
    /// Embed every chunk, one call per chunk, and store the pairs in chunk
    /// order using cosine similarity.
    ///
    /// # Errors
    ///
    /// [`RagError::EmbeddingFailure`] if any call fails or returns a vector
    /// whose length differs from [`Embedder::dims`]. The build is aborted
    /// and no index is returned.
    pub async fn build(chunks: Vec<Chunk>, embedder: &dyn Embedder) -> Result<Self> {
        Self::build_concurrent(chunks, embedder, DistanceMetric::Cosine, 1, &()).await
    }

    /// Like [`build`](Self::build) with up to `concurrency` embedding calls
    /// in flight. Pairs are stored in chunk order whatever order the calls
    /// complete in, so the result is identical to a sequential build.
    pub async fn build_concurrent(
        chunks: Vec<Chunk>,
        embedder: &dyn Embedder,
        metric: DistanceMetric,
        concurrency: usize,
        progress: &dyn BuildProgress,
    ) -> Result<Self> {
        if concurrency == 0 {
            return Err(RagError::InvalidConfiguration(
                "build concurrency must be greater than zero".to_string(),
            ));
        }

        let total = chunks.len();
        let dims = embedder.dims();
        let mut embeddings = Vec::with_capacity(total);
        {
            let mut calls = stream::iter(chunks.iter())
                .map(|chunk| embedder.embed(&chunk.text))
                .buffered(concurrency);

            while let Some(result) = calls.next().await {
                let vector = result.map_err(|e| {
                    warn!(chunk = embeddings.len(), error = %e, "embedding failed during index build");
                    RagError::EmbeddingFailure(e)
                })?;
                if vector.len() != dims {
                    return Err(RagError::EmbeddingFailure(EmbeddingError::new(
                        embedder.model_name(),
                        format!(
                            "expected {dims}-dimensional vector for chunk {}, got {}",
                            embeddings.len(),
                            vector.len()
                        ),
                    )));
                }
                embeddings.push(vector);
                progress.embedded(embeddings.len(), total);
            }
        }

        let entries = chunks
            .into_iter()
            .zip(embeddings)
            .map(|(chunk, embedding)| IndexEntry { chunk, embedding })
            .collect::<Vec<_>>();

        info!(
            chunk_count = entries.len(),
            model = embedder.model_name(),
            dims,
            %metric,
            "built vector index"
        );

        Ok(Self {
            model: embedder.model_name().to_string(),
            dims,
            metric,
            entries,
        })
    }

    /// Return the `k` entries best matching `query_vec`, best first.
    ///
    /// Returns fewer than `k` results when the index holds fewer entries.
    ///
    /// # Errors
    ///
    /// - [`RagError::InvalidConfiguration`] if `k == 0`.
    /// - [`RagError::EmptyIndex`] if the index has no entries.
    /// - [`RagError::DimensionMismatch`] if `query_vec` has the wrong length.
    pub fn query(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        if k == 0 {
            return Err(RagError::InvalidConfiguration(
                "top_k must be greater than zero".to_string(),
            ));
        }
        if self.entries.is_empty() {
            return Err(RagError::EmptyIndex);
        }
        if query_vec.len() != self.dims {
            return Err(RagError::DimensionMismatch {
                expected: self.dims,
                actual: query_vec.len(),
            });
        }

        let mut scored: Vec<(usize, f32)> = self
            .entries
            .iter()
            .enumerate()
            .map(|(i, entry)| (i, self.metric.score(query_vec, &entry.embedding)))
            .collect();
        scored.sort_by(|a, b| self.metric.rank(a.1, b.1));
        scored.truncate(k);

        debug!(k, hits = scored.len(), "vector index query");

        Ok(scored
            .into_iter()
            .map(|(i, score)| ScoredChunk {
                chunk: self.entries[i].chunk.clone(),
                score,
            })
            .collect())
    }

    pub fn entries(&self) -> &[IndexEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Model name of the embedder the index was built with.
    pub fn model_name(&self) -> &str {
        &self.model
    }

    pub fn dims(&self) -> usize {
        self.dims
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }
}
