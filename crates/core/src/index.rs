use crate::embeddings::Embedder;
use crate::error::{EmbeddingError, SearchError};
use crate::store::DocumentStore;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexHit {
    pub index: usize,
    pub similarity: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// Nothing has been indexed yet.
    NotReady,
    Hits(Vec<IndexHit>),
}

impl SearchOutcome {
    pub fn into_hits(self) -> Vec<IndexHit> {
        match self {
            SearchOutcome::NotReady => Vec::new(),
            SearchOutcome::Hits(hits) => hits,
        }
    }
}

/// Chunks and their embeddings, aligned by position and frozen after build.
#[derive(Debug, Default)]
pub struct EmbeddingIndex {
    store: DocumentStore,
    vectors: Vec<Vec<f32>>,
    dimensions: usize,
}

impl EmbeddingIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Embeds every chunk of `store` in a single batch. An empty store is
    /// indexed without calling the embedder.
    pub async fn build<E>(store: DocumentStore, embedder: &E) -> Result<Self, SearchError>
    where
        E: Embedder + ?Sized,
    {
        if store.is_empty() {
            warn!("no document chunks to embed; index left empty");
            return Ok(Self {
                store,
                vectors: Vec::new(),
                dimensions: embedder.dimensions(),
            });
        }

        info!(chunk_count = store.len(), "creating embeddings");
        let vectors = embedder.encode(store.texts()).await?;
        if vectors.len() != store.len() {
            return Err(SearchError::Embedding(
                EmbeddingError::CountMismatch {
                    expected: store.len(),
                    actual: vectors.len(),
                },
            ));
        }

        let dimensions = vectors.first().map(Vec::len).unwrap_or_default();
        if let Some(bad) = vectors.iter().find(|vector| vector.len() != dimensions) {
            return Err(SearchError::DimensionMismatch {
                expected: dimensions,
                actual: bad.len(),
            });
        }

        info!(chunk_count = store.len(), dimensions, "index built");
        Ok(Self {
            store,
            vectors,
            dimensions,
        })
    }

    pub fn is_ready(&self) -> bool {
        !self.vectors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// Ranks every stored chunk against `query` by cosine similarity and
    /// returns the best `top_k`, highest first, lower index first on ties.
    pub async fn search<E>(
        &self,
        embedder: &E,
        query: &str,
        top_k: usize,
    ) -> Result<SearchOutcome, SearchError>
    where
        E: Embedder + ?Sized,
    {
        if !self.is_ready() {
            warn!("no embeddings available; ingest documents first");
            return Ok(SearchOutcome::NotReady);
        }

        let mut encoded = embedder.encode(&[query.to_string()]).await?;
        let query_vector = encoded.pop().ok_or(SearchError::Embedding(
            EmbeddingError::CountMismatch {
                expected: 1,
                actual: 0,
            },
        ))?;
        if query_vector.len() != self.dimensions {
            return Err(SearchError::DimensionMismatch {
                expected: self.dimensions,
                actual: query_vector.len(),
            });
        }

        Ok(SearchOutcome::Hits(rank(&query_vector, &self.vectors, top_k)))
    }
}

pub fn cosine_similarity(left: &[f32], right: &[f32]) -> f32 {
    let dot = left.iter().zip(right).map(|(a, b)| a * b).sum::<f32>();
    let left_norm = left.iter().map(|value| value * value).sum::<f32>().sqrt();
    let right_norm = right.iter().map(|value| value * value).sum::<f32>().sqrt();

    if left_norm == 0.0 || right_norm == 0.0 {
        return 0.0;
    }
    (dot / (left_norm * right_norm)).clamp(-1.0, 1.0)
}

fn rank(query: &[f32], vectors: &[Vec<f32>], top_k: usize) -> Vec<IndexHit> {
    let mut hits = vectors
        .iter()
        .enumerate()
        .map(|(index, vector)| IndexHit {
            index,
            similarity: cosine_similarity(query, vector),
        })
        .filter(|hit| hit.similarity.is_finite())
        .collect::<Vec<_>>();

    hits.sort_by(|left, right| {
        right
            .similarity
            .total_cmp(&left.similarity)
            .then_with(|| left.index.cmp(&right.index))
    });
    hits.truncate(top_k);
    hits
}

/// Shared reference to the serving index. Readers take a snapshot; a rebuild
/// swaps in a complete replacement.
#[derive(Debug, Clone, Default)]
pub struct IndexHandle {
    current: Arc<RwLock<Arc<EmbeddingIndex>>>,
}

impl IndexHandle {
    pub fn new(index: EmbeddingIndex) -> Self {
        Self {
            current: Arc::new(RwLock::new(Arc::new(index))),
        }
    }

    pub fn snapshot(&self) -> Arc<EmbeddingIndex> {
        Arc::clone(&self.current.read())
    }

    pub fn replace(&self, index: EmbeddingIndex) -> Arc<EmbeddingIndex> {
        let mut guard = self.current.write();
        std::mem::replace(&mut *guard, Arc::new(index))
    }
}
