use crate::embeddings::Embedder;
use crate::index::IndexHandle;
use crate::models::RetrievalResult;
use tracing::{debug, warn};

pub const DEFAULT_TOP_K: usize = 5;
pub const DEFAULT_MIN_SIMILARITY: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetrievalConfig {
    pub top_k: usize,
    /// Results at or below this similarity are dropped.
    pub min_similarity: f32,
    /// Upper bound on the joined context handed to the answer model.
    pub context_char_budget: Option<usize>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            min_similarity: DEFAULT_MIN_SIMILARITY,
            context_char_budget: None,
        }
    }
}

pub struct Retriever<E> {
    index: IndexHandle,
    embedder: E,
    config: RetrievalConfig,
}

impl<E> Retriever<E>
where
    E: Embedder,
{
    pub fn new(index: IndexHandle, embedder: E, config: RetrievalConfig) -> Self {
        Self {
            index,
            embedder,
            config,
        }
    }

    pub fn index(&self) -> &IndexHandle {
        &self.index
    }

    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    pub fn config(&self) -> RetrievalConfig {
        self.config
    }

    pub async fn retrieve(&self, query: &str) -> Vec<RetrievalResult> {
        self.retrieve_with(query, self.config.top_k, self.config.min_similarity)
            .await
    }

    /// Returns passages scoring strictly above `min_similarity`, best first.
    /// An empty result means there is not enough context to answer.
    pub async fn retrieve_with(
        &self,
        query: &str,
        top_k: usize,
        min_similarity: f32,
    ) -> Vec<RetrievalResult> {
        let index = self.index.snapshot();
        let hits = match index.search(&self.embedder, query, top_k).await {
            Ok(outcome) => outcome.into_hits(),
            Err(error) => {
                warn!(%error, "similarity search failed");
                return Vec::new();
            }
        };

        let results = hits
            .into_iter()
            .filter(|hit| hit.similarity > min_similarity)
            .filter_map(|hit| {
                let chunk = index.store().get(hit.index)?;
                Some(RetrievalResult {
                    content: chunk.text,
                    similarity: hit.similarity,
                    metadata: chunk.metadata,
                })
            })
            .collect::<Vec<_>>();

        debug!(query, results = results.len(), "retrieved passages");
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embeddings::CharacterNgramEmbedder;
    use crate::index::tests::{store_of, TableEmbedder};
    use crate::index::EmbeddingIndex;

    async fn retriever_over(
        texts: &[&str],
        embedder: TableEmbedder,
    ) -> Retriever<TableEmbedder> {
        let index = EmbeddingIndex::build(store_of(texts), &embedder)
            .await
            .unwrap();
        Retriever::new(IndexHandle::new(index), embedder, RetrievalConfig::default())
    }

    #[tokio::test]
    async fn similarity_equal_to_threshold_is_excluded() {
        let embedder = TableEmbedder::new(&[
            ("exact", vec![1.0, 0.0]),
            ("boundary", vec![0.0, 1.0]),
            ("query", vec![1.0, 0.0]),
        ]);
        let retriever = retriever_over(&["boundary", "exact"], embedder).await;

        let results = retriever.retrieve_with("query", 5, 0.0).await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, "exact");
        assert_eq!(results[0].metadata.sequence_index, 1);

        let none = retriever.retrieve_with("query", 5, 1.0).await;
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn results_keep_descending_order_after_filtering() {
        let embedder = TableEmbedder::new(&[
            ("low", vec![0.05, 1.0]),
            ("high", vec![1.0, 0.1]),
            ("mid", vec![1.0, 1.0]),
            ("query", vec![1.0, 0.0]),
        ]);
        let retriever = retriever_over(&["low", "high", "mid"], embedder).await;

        let results = retriever.retrieve("query").await;
        let contents = results
            .iter()
            .map(|result| result.content.as_str())
            .collect::<Vec<_>>();
        assert_eq!(contents, ["high", "mid"]);
    }

    #[tokio::test]
    async fn embedding_failure_yields_no_results() {
        let embedder = TableEmbedder::new(&[("chunk", vec![1.0, 0.0])]);
        let retriever = retriever_over(&["chunk"], embedder).await;
        assert!(retriever.retrieve("unknown query").await.is_empty());
    }

    #[tokio::test]
    async fn empty_index_returns_nothing_without_embedding() {
        let embedder = TableEmbedder::default();
        let retriever = Retriever::new(IndexHandle::default(), embedder, RetrievalConfig::default());
        assert!(retriever.retrieve("What is KALIA Yojana?").await.is_empty());
        assert_eq!(retriever.embedder().calls(), 0);
    }

    #[tokio::test]
    async fn single_kalia_chunk_is_the_only_result() {
        let embedder = CharacterNgramEmbedder::default();
        let chunk = "KALIA Yojana provides financial assistance to farmers.";
        let index = EmbeddingIndex::build(store_of(&[chunk]), &embedder)
            .await
            .unwrap();
        let retriever = Retriever::new(IndexHandle::new(index), embedder, RetrievalConfig::default());

        let results = retriever.retrieve("What is KALIA Yojana?").await;
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].content, chunk);
        assert!(results[0].similarity > DEFAULT_MIN_SIMILARITY);
    }
}
