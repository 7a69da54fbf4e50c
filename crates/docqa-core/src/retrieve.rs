//! Query-time retrieval: embed the query, then rank the index.

use tracing::debug;

use crate::embedding::Embedder;
use crate::error::{RagError, Result};
use crate::index::{ScoredChunk, VectorIndex};
use crate::models::Chunk;

/// Pairs a built [`VectorIndex`] with the embedder used for queries.
///
/// Construction checks that the embedder matches the one the index was
/// built with (same model name, same dimension).
pub struct Retriever<'a> {
    index: &'a VectorIndex,
    embedder: &'a dyn Embedder,
}

impl<'a> Retriever<'a> {
    /// # Errors
    ///
    /// [`RagError::InvalidConfiguration`] if the embedder's model or
    /// dimension differs from the index's.
    pub fn new(index: &'a VectorIndex, embedder: &'a dyn Embedder) -> Result<Self> {
        if embedder.model_name() != index.model_name() || embedder.dims() != index.dims() {
            return Err(RagError::InvalidConfiguration(format!(
                "query embedder {} ({} dims) does not match index embedder {} ({} dims)",
                embedder.model_name(),
                embedder.dims(),
                index.model_name(),
                index.dims()
            )));
        }
        Ok(Self { index, embedder })
    }

    /// Return the `k` chunks most similar to `query`, best first.
    pub async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<Chunk>> {
        Ok(self
            .retrieve_scored(query, k)
            .await?
            .into_iter()
            .map(|hit| hit.chunk)
            .collect())
    }

    /// Like [`retrieve`](Self::retrieve) but keeps each hit's score.
    pub async fn retrieve_scored(&self, query: &str, k: usize) -> Result<Vec<ScoredChunk>> {
        let query_vec = self.embed_query(query).await?;
        self.rank(&query_vec, k)
    }

    /// Embed query text with the index's embedder.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>> {
        Ok(self.embedder.embed(query).await?)
    }

    /// Rank the index against an already-embedded query.
    pub fn rank(&self, query_vec: &[f32], k: usize) -> Result<Vec<ScoredChunk>> {
        let hits = self.index.query(query_vec, k)?;
        debug!(
            k,
            hits = hits.len(),
            best = hits.first().map(|h| h.score),
            "retrieved chunks"
        );
        Ok(hits)
    }

    pub fn index(&self) -> &VectorIndex {
        self.index
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use async_trait::async_trait;

    /// Embeds text as letter counts for `a`, `b`, `c`.
    struct LetterEmbedder {
        model: &'static str,
    }

    #[async_trait]
    impl Embedder for LetterEmbedder {
        fn model_name(&self) -> &str {
            self.model
        }
        fn dims(&self) -> usize {
            3
        }
        async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
            if text.is_empty() {
                return Err(EmbeddingError::new(self.model, "empty input"));
            }
            Ok(['a', 'b', 'c']
                .iter()
                .map(|l| text.chars().filter(|c| c == l).count() as f32)
                .collect())
        }
    }

    fn chunk(index: usize, text: &str) -> Chunk {
        Chunk {
            index,
            start: 0,
            end: text.len(),
            text: text.to_string(),
            hash: String::new(),
        }
    }

    async fn index() -> VectorIndex {
        let chunks = vec![chunk(0, "aaa"), chunk(1, "bbb"), chunk(2, "ccc"), chunk(3, "abc")];
        VectorIndex::build(chunks, &LetterEmbedder { model: "letters" })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_retrieve_rank_order() {
        let index = index().await;
        let embedder = LetterEmbedder { model: "letters" };
        let retriever = Retriever::new(&index, &embedder).unwrap();
        let chunks = retriever.retrieve("bb", 2).await.unwrap();
        assert_eq!(chunks[0].text, "bbb");
        assert_eq!(chunks[1].text, "abc");
    }

    #[tokio::test]
    async fn test_mismatched_embedder_rejected() {
        let index = index().await;
        let other = LetterEmbedder { model: "other" };
        assert!(matches!(
            Retriever::new(&index, &other),
            Err(RagError::InvalidConfiguration(_))
        ));
    }

    #[tokio::test]
    async fn test_query_embedding_failure() {
        let index = index().await;
        let embedder = LetterEmbedder { model: "letters" };
        let retriever = Retriever::new(&index, &embedder).unwrap();
        assert!(matches!(
            retriever.retrieve("", 2).await,
            Err(RagError::EmbeddingFailure(_))
        ));
    }
}
