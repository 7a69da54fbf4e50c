//! Single-slot document cache.
//!
//! Holds the most recently loaded document together with the pipeline
//! built over it. Asking about the same URL again reuses both; a different
//! URL replaces the slot. Nothing is evicted implicitly otherwise.

use docqa_core::{Document, QaPipeline};
use tracing::debug;

/// A loaded document and the pipeline over its index.
pub struct CachedDocument {
    pub url: String,
    pub document: Document,
    pub chunk_count: usize,
    pub pipeline: QaPipeline,
}

#[derive(Default)]
pub struct DocumentCache {
    slot: Option<CachedDocument>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.slot.as_ref().is_some_and(|c| c.url == url)
    }

    pub fn current(&self) -> Option<&CachedDocument> {
        self.slot.as_ref()
    }

    /// Store `entry`, dropping whatever was cached before.
    pub fn insert(&mut self, entry: CachedDocument) {
        if let Some(old) = &self.slot {
            debug!(old = %old.url, new = %entry.url, "replacing cached document");
        }
        self.slot = Some(entry);
    }

    pub fn invalidate(&mut self) {
        if let Some(old) = self.slot.take() {
            debug!(url = %old.url, "invalidated cached document");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use docqa_core::{
        ChatMessage, Embedder, EmbeddingError, LanguageModel, ModelError, PipelineOptions,
        VectorIndex,
    };
    use std::sync::Arc;

    struct Unit;

    #[async_trait]
    impl Embedder for Unit {
        fn model_name(&self) -> &str {
            "unit"
        }
        fn dims(&self) -> usize {
            1
        }
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
            Ok(vec![1.0])
        }
    }

    #[async_trait]
    impl LanguageModel for Unit {
        fn model_name(&self) -> &str {
            "unit"
        }
        async fn complete(&self, _messages: &[ChatMessage]) -> Result<String, ModelError> {
            Ok(String::new())
        }
    }

    async fn entry(url: &str) -> CachedDocument {
        let index = VectorIndex::build(Vec::new(), &Unit).await.unwrap();
        let pipeline =
            QaPipeline::new(index, Arc::new(Unit), Arc::new(Unit), PipelineOptions::default())
                .unwrap();
        CachedDocument {
            url: url.to_string(),
            document: Document::new(url, ""),
            chunk_count: 0,
            pipeline,
        }
    }

    #[tokio::test]
    async fn same_url_hits_different_url_replaces() {
        let mut cache = DocumentCache::new();
        assert!(!cache.contains("a"));

        cache.insert(entry("a").await);
        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));

        cache.insert(entry("b").await);
        assert!(!cache.contains("a"));
        assert_eq!(cache.current().unwrap().url, "b");
    }

    #[tokio::test]
    async fn invalidate_empties_slot() {
        let mut cache = DocumentCache::new();
        cache.insert(entry("a").await);
        cache.invalidate();
        assert!(cache.current().is_none());
    }
}
