//! Test-only deterministic embedding provider.

use crate::error::Result;
use crate::provider::{EmbeddingProvider, EmbeddingResult};
use async_trait::async_trait;
use half::f16;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Deterministic embedding provider for tests.
///
/// Each whitespace token is hashed into a bucket of a fixed-size vector,
/// which is then normalized. Identical texts always produce identical
/// vectors, and texts sharing tokens score higher cosine similarity than
/// unrelated texts, so retrieval ordering is meaningful without loading a
/// real model.
#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dimension: usize,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self { dimension: 16 }
    }
}

impl MockEmbeddingProvider {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn embed_sync(&self, text: &str) -> Vec<f16> {
        let mut vector = vec![0f32; self.dimension];
        for token in text.split_whitespace() {
            let token: String = token
                .chars()
                .filter(|c| c.is_alphanumeric())
                .collect::<String>()
                .to_lowercase();
            if token.is_empty() {
                continue;
            }
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            let bucket = (hasher.finish() as usize) % self.dimension;
            vector[bucket] += 1.0;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector.into_iter().map(f16::from_f32).collect()
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed_text(&self, text: &str) -> Result<Vec<f16>> {
        Ok(self.embed_sync(text))
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<EmbeddingResult> {
        Ok(EmbeddingResult::new(
            texts.iter().map(|t| self.embed_sync(t)).collect(),
        ))
    }

    fn embedding_dimension(&self) -> usize {
        self.dimension
    }

    fn provider_name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cosine(a: &[f16], b: &[f16]) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| x.to_f32() * y.to_f32())
            .sum()
    }

    #[tokio::test]
    async fn test_identical_text_identical_vector() {
        let provider = MockEmbeddingProvider::default();
        let a = provider.embed_text("the answer is 42").await.unwrap();
        let b = provider.embed_text("the answer is 42").await.unwrap();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_shared_tokens_score_higher() {
        let provider = MockEmbeddingProvider::default();
        let query = provider.embed_text("what is the answer").await.unwrap();
        let related = provider
            .embed_text("the answer to everything is 42")
            .await
            .unwrap();
        let unrelated = provider
            .embed_text("zip archives contain compressed entries")
            .await
            .unwrap();

        assert!(cosine(&query, &related) > cosine(&query, &unrelated));
    }
}
