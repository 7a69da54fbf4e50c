//! Error types for the docqa pipeline.
//!
//! Collaborators report their own failures ([`FetchError`],
//! [`EmbeddingError`], [`ModelError`]); the pipeline wraps them into the
//! single [`RagError`] taxonomy. Every stage fails fast and hands the first
//! error back to the caller unchanged. Nothing here is retried.

use thiserror::Error;

use crate::pipeline::QueryStage;

/// The document loader could not fetch or parse a document.
#[derive(Debug, Error)]
#[error("failed to fetch '{source_url}': {message}")]
pub struct FetchError {
    pub source_url: String,
    pub message: String,
}

impl FetchError {
    pub fn new(source_url: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            source_url: source_url.into(),
            message: message.into(),
        }
    }
}

/// The embedder failed to produce a vector.
#[derive(Debug, Error)]
#[error("embedding error ({provider}): {message}")]
pub struct EmbeddingError {
    pub provider: String,
    pub message: String,
}

impl EmbeddingError {
    pub fn new(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            provider: provider.into(),
            message: message.into(),
        }
    }
}

/// The language model call errored or timed out.
#[derive(Debug, Error)]
#[error("model error ({model}): {message}")]
pub struct ModelError {
    pub model: String,
    pub message: String,
}

impl ModelError {
    pub fn new(model: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            message: message.into(),
        }
    }
}

/// Errors surfaced by pipeline operations.
#[derive(Debug, Error)]
pub enum RagError {
    /// Bad chunking, retrieval, or wiring parameters. A caller error.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// An embedding call failed; index builds abort without a partial index.
    #[error(transparent)]
    EmbeddingFailure(#[from] EmbeddingError),

    /// A vector did not have the dimension the index was built with.
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Query against an index with zero entries.
    #[error("vector index is empty")]
    EmptyIndex,

    #[error(transparent)]
    GenerationFailure(#[from] ModelError),
}

impl RagError {
    /// The earliest query stage this kind of error can be raised from.
    ///
    /// `InvalidConfiguration` maps to `Idle` even when a query rejects its
    /// `top_k` while retrieving; [`QaPipeline`](crate::QaPipeline) logs the
    /// stage it actually failed in.
    pub fn stage(&self) -> QueryStage {
        match self {
            RagError::InvalidConfiguration(_) | RagError::Fetch(_) => QueryStage::Idle,
            RagError::EmbeddingFailure(_) => QueryStage::EmbeddingQuery,
            RagError::DimensionMismatch { .. } | RagError::EmptyIndex => QueryStage::Retrieving,
            RagError::GenerationFailure(_) => QueryStage::Generating,
        }
    }
}

/// Convenience alias for pipeline results.
pub type Result<T> = std::result::Result<T, RagError>;
