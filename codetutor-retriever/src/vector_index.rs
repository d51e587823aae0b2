//! In-memory similarity index over embedded chunks.

use anyhow::Result;
use codetutor_context::TextChunk;
use codetutor_embed::EmbeddingProvider;
use half::f16;

/// Default number of chunks returned per query.
pub const DEFAULT_TOP_K: usize = 4;

/// One embedded chunk, owned by the index.
#[derive(Debug, Clone)]
pub struct IndexedVector {
    pub embedding: Vec<f16>,
    pub chunk: TextChunk,
}

/// A retrieval hit: a chunk and its cosine similarity to the query.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: TextChunk,
    pub similarity: f32,
}

/// The session's similarity index.
///
/// Built in one pass over all chunks of a processing action; there is no
/// incremental update. Building a new index and installing it in place of
/// the old one is how re-uploads are handled.
#[derive(Debug, Default)]
pub struct VectorIndex {
    vectors: Vec<IndexedVector>,
    dimension: usize,
}

impl VectorIndex {
    /// Embed every chunk and assemble the index.
    ///
    /// The index is only returned once every chunk has been embedded; any
    /// embedding failure aborts the build with nothing half-constructed, so
    /// a caller holding a previous index keeps it untouched.
    pub async fn build(
        provider: &dyn EmbeddingProvider,
        chunks: Vec<TextChunk>,
    ) -> Result<Self> {
        if chunks.is_empty() {
            return Ok(Self::default());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.text.clone()).collect();
        let result = provider.embed_texts(&texts).await?;

        if result.len() != chunks.len() {
            anyhow::bail!(
                "embedding count mismatch: {} chunks, {} vectors",
                chunks.len(),
                result.len()
            );
        }

        let dimension = result.dimension;
        let vectors = result
            .embeddings
            .into_iter()
            .zip(chunks)
            .map(|(embedding, chunk)| IndexedVector { embedding, chunk })
            .collect();

        tracing::debug!(dimension, "built vector index");

        Ok(Self { vectors, dimension })
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Dimension of the indexed embeddings (0 for an empty index).
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Return up to `limit` chunks ranked by cosine similarity to the query
    /// embedding, best first. Deterministic for a fixed index and query.
    pub fn search(&self, query_embedding: &[f16], limit: usize) -> Vec<ScoredChunk> {
        let mut scored: Vec<ScoredChunk> = self
            .vectors
            .iter()
            .map(|v| ScoredChunk {
                chunk: v.chunk.clone(),
                similarity: cosine_similarity(query_embedding, &v.embedding),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.similarity
                .partial_cmp(&a.similarity)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(limit);
        scored
    }
}

/// Calculate cosine similarity between two f16 embedding vectors
fn cosine_similarity(a: &[f16], b: &[f16]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot_product: f32 = a
        .iter()
        .zip(b.iter())
        .map(|(x, y)| f32::from(*x) * f32::from(*y))
        .sum();

    let norm_a: f32 = a.iter().map(|x| f32::from(*x).powi(2)).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| f32::from(*x).powi(2)).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}
