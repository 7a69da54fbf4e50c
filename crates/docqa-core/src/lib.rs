//! # docqa core
//!
//! Pure pipeline logic for docqa: data models, the fixed-window chunker,
//! the in-memory vector index, the retriever, answer assembly, and the
//! traits the application implements for its external collaborators
//! (document loader, embedder, language model).
//!
//! This crate does no HTTP, filesystem, or configuration work. Every
//! collaborator is injected through a trait so the pipeline can be driven
//! by stubs in tests.
//!
//! ```text
//!  DocumentLoader ─▶ chunk::split ─▶ VectorIndex::build ─┐
//!                                        (Embedder)      │
//!                                                        ▼
//!  query ─▶ Retriever::retrieve ─▶ AnswerGenerator::generate ─▶ Answer
//!            (Embedder + index)        (LanguageModel)
//! ```

pub mod answer;
pub mod chunk;
pub mod embedding;
pub mod error;
pub mod index;
pub mod loader;
pub mod models;
pub mod pipeline;
pub mod retrieve;

pub use answer::{AnswerGenerator, ChatMessage, ContextBudget, LanguageModel, Role};
pub use chunk::{split, ChunkingParams};
pub use embedding::Embedder;
pub use error::{EmbeddingError, FetchError, ModelError, RagError, Result};
pub use index::{BuildProgress, DistanceMetric, ScoredChunk, VectorIndex};
pub use loader::DocumentLoader;
pub use models::{Answer, Chunk, Document};
pub use pipeline::{PipelineOptions, QaPipeline, QueryStage};
pub use retrieve::Retriever;
