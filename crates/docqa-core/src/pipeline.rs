//! Question-answering pipeline.
//!
//! [`QaPipeline`] owns a built [`VectorIndex`] and answers queries against
//! it. Each [`ask`](QaPipeline::ask) is one stateless request/response
//! cycle:
//!
//! ```text
//! Idle ─▶ EmbeddingQuery ─▶ Retrieving ─▶ Generating ─▶ Done
//!              │                 │             │
//!              └─────────────────┴─────────────┴──▶ Failed
//! ```
//!
//! A stage failure goes straight to `Failed` and the error is returned
//! unchanged. Nothing is cached or retried, and the index is never
//! touched by a query, so a failed query leaves it fully usable.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::answer::{AnswerGenerator, ContextBudget, LanguageModel, DEFAULT_SYSTEM_PROMPT};
use crate::chunk::{split, ChunkingParams};
use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::index::{BuildProgress, DistanceMetric, VectorIndex};
use crate::models::{Answer, Document};
use crate::retrieve::Retriever;

/// Stage of a single query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryStage {
    Idle,
    EmbeddingQuery,
    Retrieving,
    Generating,
    Done,
    Failed,
}

impl fmt::Display for QueryStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            QueryStage::Idle => "idle",
            QueryStage::EmbeddingQuery => "embedding_query",
            QueryStage::Retrieving => "retrieving",
            QueryStage::Generating => "generating",
            QueryStage::Done => "done",
            QueryStage::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Retrieval and generation settings.
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Chunks retrieved per query.
    pub top_k: usize,
    pub metric: DistanceMetric,
    pub budget: ContextBudget,
    /// Instruction template with a `{context}` placeholder.
    pub system_prompt: String,
    /// Embedding calls in flight while building the index.
    pub build_concurrency: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            top_k: 4,
            metric: DistanceMetric::Cosine,
            budget: ContextBudget::default(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            build_concurrency: 1,
        }
    }
}

pub struct QaPipeline {
    index: VectorIndex,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn LanguageModel>,
    options: PipelineOptions,
}

impl QaPipeline {
    /// Wrap an already-built index.
    ///
    /// # Errors
    ///
    /// [`RagError::InvalidConfiguration`] if `top_k == 0` or the embedder
    /// does not match the one the index was built with.
    pub fn new(
        index: VectorIndex,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
        options: PipelineOptions,
    ) -> Result<Self> {
        if options.top_k == 0 {
            return Err(RagError::InvalidConfiguration(
                "top_k must be greater than zero".to_string(),
            ));
        }
        Retriever::new(&index, embedder.as_ref())?;
        Ok(Self {
            index,
            embedder,
            model,
            options,
        })
    }

    /// Chunk `document`, embed every chunk, and wrap the resulting index.
    pub async fn from_document(
        document: &Document,
        params: &ChunkingParams,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
        options: PipelineOptions,
        progress: &dyn BuildProgress,
    ) -> Result<Self> {
        let chunks = split(document, params)?;
        debug!(source = %document.source, chunk_count = chunks.len(), "split document");
        progress.chunked(document, chunks.len());
        let index = VectorIndex::build_concurrent(
            chunks,
            embedder.as_ref(),
            options.metric,
            options.build_concurrency,
            progress,
        )
        .await?;
        Self::new(index, embedder, model, options)
    }

    /// Answer `query` from the indexed document.
    pub async fn ask(&self, query: &str) -> Result<Answer> {
        self.ask_with_top_k(query, self.options.top_k).await
    }

    pub async fn ask_with_top_k(&self, query: &str, top_k: usize) -> Result<Answer> {
        let mut stage = QueryStage::Idle;
        let result = self.run(query, top_k, &mut stage).await;
        if let Err(err) = &result {
            warn!(%stage, to = %QueryStage::Failed, error = %err, "query failed");
        }
        result
    }

    /// One pass through the stages. On error `stage` is the one that failed.
    async fn run(&self, query: &str, top_k: usize, stage: &mut QueryStage) -> Result<Answer> {
        let retriever = Retriever::new(&self.index, self.embedder.as_ref())?;
        let generator = AnswerGenerator::new(self.model.as_ref())
            .with_system_prompt(&self.options.system_prompt)
            .with_budget(self.options.budget);

        advance(stage, QueryStage::EmbeddingQuery);
        let query_vec = retriever.embed_query(query).await?;

        advance(stage, QueryStage::Retrieving);
        let chunks = retriever
            .rank(&query_vec, top_k)?
            .into_iter()
            .map(|hit| hit.chunk)
            .collect();

        advance(stage, QueryStage::Generating);
        let answer = generator.generate(query, chunks).await?;

        advance(stage, QueryStage::Done);
        Ok(answer)
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }
}

fn advance(stage: &mut QueryStage, to: QueryStage) {
    debug!(from = %*stage, %to, "query stage");
    *stage = to;
}
