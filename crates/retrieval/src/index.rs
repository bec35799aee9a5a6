//! In-memory vector index over a fixed set of texts.
//!
//! Entries are addressed by their position in the slice the index was built
//! from, so callers keep ownership of the texts themselves.

use tracing::debug;

use crate::embeddings::{EmbeddingError, EmbeddingProvider};

/// A retrieved entry: position in the source slice and cosine similarity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit {
    pub position: usize,
    pub score: f32,
}

#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    vectors: Vec<Vec<f32>>,
    dims: usize,
}

impl VectorIndex {
    /// Embed every text through `embedder`. An empty input builds an empty
    /// index without calling the provider. Every vector must have the
    /// provider's advertised dimensions.
    pub async fn build(
        embedder: &dyn EmbeddingProvider,
        texts: &[String],
    ) -> Result<Self, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Self::default());
        }
        let vectors = embedder.embed_batch(texts).await?;
        if vectors.len() != texts.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: texts.len(),
                got: vectors.len(),
            });
        }
        let dims = embedder.dimensions();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dims) {
            return Err(EmbeddingError::DimensionMismatch {
                expected: dims,
                got: bad.len(),
            });
        }
        debug!(
            dims,
            entries = vectors.len(),
            model = embedder.model_name(),
            "built vector index"
        );
        Ok(Self { vectors, dims })
    }

    /// Wrap precomputed vectors. The first vector fixes the dimensions.
    pub fn from_vectors(vectors: Vec<Vec<f32>>) -> Self {
        let dims = vectors.first().map_or(0, Vec::len);
        Self { vectors, dims }
    }

    pub fn dimensions(&self) -> usize {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Embed `query` and return up to `k` entries, most similar first.
    pub async fn search(
        &self,
        embedder: &dyn EmbeddingProvider,
        query: &str,
        k: usize,
    ) -> Result<Vec<SearchHit>, EmbeddingError> {
        if self.vectors.is_empty() || k == 0 {
            return Ok(Vec::new());
        }
        let query_vec = embedder.embed(query).await?;
        if query_vec.len() != self.dims {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dims,
                got: query_vec.len(),
            });
        }
        Ok(self.nearest(&query_vec, k))
    }

    /// Rank stored vectors against an already embedded query. Ties keep
    /// insertion order.
    pub fn nearest(&self, query: &[f32], k: usize) -> Vec<SearchHit> {
        let mut hits: Vec<SearchHit> = self
            .vectors
            .iter()
            .enumerate()
            .map(|(position, v)| SearchHit {
                position,
                score: cosine_similarity(query, v),
            })
            .collect();
        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(k);
        hits
    }
}

/// Cosine similarity; zero-length or mismatched vectors score 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
