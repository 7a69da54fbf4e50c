//! # docqa
//!
//! Ask questions about a single document with retrieval-augmented
//! generation.
//!
//! A document (PDF, DOCX, or text) is fetched from a URL or path, split into
//! overlapping character windows, embedded into an in-memory vector index,
//! and queried: the question is embedded, the closest chunks are retrieved,
//! and a chat model answers from them.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌──────────────┐   ┌──────────────┐
//! │ HttpLoader  │──▶│ chunk::split │──▶│ VectorIndex  │
//! │ PDF/DOCX/txt│   │              │   │ (Embedder)   │
//! └─────────────┘   └──────────────┘   └──────┬───────┘
//!                                             │
//!          question ─▶ Retriever ─────────────┤
//!                                             ▼
//!                                    ┌─────────────────┐
//!                                    │ AnswerGenerator │
//!                                    │   (ChatModel)   │
//!                                    └─────────────────┘
//! ```
//!
//! The pipeline itself lives in `docqa-core`; this crate supplies the
//! concrete HTTP collaborators, configuration, caching, and the CLI.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`loader`] | URL and file document loader |
//! | [`extract`] | PDF / DOCX / text extraction |
//! | [`embedding`] | Embedding providers |
//! | [`llm`] | OpenAI-compatible chat model |
//! | [`cache`] | Single-slot document cache |
//! | [`qa`] | Collaborator wiring and document lifecycle |
//! | [`session`] | Multi-turn chat state |
//! | [`progress`] | Load progress on stderr |

pub mod ask;
pub mod cache;
pub mod chat;
pub mod config;
pub mod embedding;
pub mod extract;
pub mod inspect;
pub mod llm;
pub mod loader;
pub mod progress;
pub mod qa;
pub mod repl;
pub mod session;
