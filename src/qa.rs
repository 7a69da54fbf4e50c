//! Wires the concrete collaborators to the core pipeline.
//!
//! [`DocumentQa`] owns the loader, embedder, and model plus the document
//! cache. Commands go through it: `load` fetches, chunks, and indexes a URL
//! (or reuses the cached one), `ask` runs one query against it.

use std::sync::Arc;

use anyhow::{Context, Result};
use docqa_core::{
    split, Answer, Chunk, ChunkingParams, Document, DocumentLoader, Embedder, LanguageModel,
    PipelineOptions, QaPipeline,
};
use tracing::{debug, info};

use crate::cache::{CachedDocument, DocumentCache};
use crate::config::Config;
use crate::embedding::create_embedder;
use crate::llm::ChatModel;
use crate::loader::HttpLoader;
use crate::progress::{EmbedProgress, ProgressEvent, ProgressReporter};

pub struct DocumentQa {
    loader: Arc<dyn DocumentLoader>,
    embedder: Arc<dyn Embedder>,
    model: Arc<dyn LanguageModel>,
    params: ChunkingParams,
    options: PipelineOptions,
    progress: Box<dyn ProgressReporter>,
    cache: DocumentCache,
}

impl DocumentQa {
    pub fn new(
        loader: Arc<dyn DocumentLoader>,
        embedder: Arc<dyn Embedder>,
        model: Arc<dyn LanguageModel>,
        params: ChunkingParams,
        options: PipelineOptions,
        progress: Box<dyn ProgressReporter>,
    ) -> Self {
        Self {
            loader,
            embedder,
            model,
            params,
            options,
            progress,
            cache: DocumentCache::new(),
        }
    }

    /// Build every collaborator from `config`.
    pub fn from_config(config: &Config, progress: Box<dyn ProgressReporter>) -> Result<Self> {
        let loader = HttpLoader::new(&config.loader)?;
        let embedder = create_embedder(&config.embedding)?;
        let model = ChatModel::from_config(&config.llm)?;
        Ok(Self::new(
            Arc::new(loader),
            embedder,
            Arc::new(model),
            config.chunking.params()?,
            config.pipeline_options()?,
            progress,
        ))
    }

    /// Load and index `url`, reusing the cached pipeline for a repeat URL.
    pub async fn load(&mut self, url: &str) -> Result<&CachedDocument> {
        if self.cache.contains(url) {
            debug!(url, "document cache hit");
        } else {
            let entry = self.build(url).await?;
            self.cache.insert(entry);
        }
        self.cache.current().context("document cache is empty")
    }

    /// Drop the cached document so the next `load` rebuilds it.
    pub fn invalidate(&mut self) {
        self.cache.invalidate();
    }

    /// Answer `question` about `url`.
    pub async fn ask(&mut self, url: &str, question: &str, top_k: Option<usize>) -> Result<Answer> {
        let cached = self.load(url).await?;
        let top_k = top_k.unwrap_or(cached.pipeline.options().top_k);
        Ok(cached.pipeline.ask_with_top_k(question, top_k).await?)
    }

    /// Fetch and chunk `url` without embedding anything.
    pub async fn chunk_only(&self, url: &str) -> Result<(Document, Vec<Chunk>)> {
        let document = self.fetch(url).await?;
        let chunks = split(&document, &self.params)?;
        self.progress.report(ProgressEvent::Chunked {
            chars: document.char_len(),
            chunks: chunks.len(),
        });
        Ok((document, chunks))
    }

    pub fn params(&self) -> &ChunkingParams {
        &self.params
    }

    async fn fetch(&self, url: &str) -> Result<Document> {
        self.progress.report(ProgressEvent::Fetching {
            url: url.to_string(),
        });
        Ok(self.loader.load(url).await?)
    }

    async fn build(&self, url: &str) -> Result<CachedDocument> {
        let document = self.fetch(url).await?;
        let pipeline = QaPipeline::from_document(
            &document,
            &self.params,
            Arc::clone(&self.embedder),
            Arc::clone(&self.model),
            self.options.clone(),
            &EmbedProgress(self.progress.as_ref()),
        )
        .await
        .with_context(|| format!("Failed to index {url}"))?;
        let chunk_count = pipeline.index().len();
        info!(url, chunk_count, "document ready");
        Ok(CachedDocument {
            url: url.to_string(),
            document,
            chunk_count,
            pipeline,
        })
    }
}
