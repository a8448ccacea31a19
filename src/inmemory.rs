//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] keeps records in a `HashMap` behind a
//! `tokio::sync::RwLock`. Suitable for development, tests, and small
//! corpora; the remote backend for real deployments lives in
//! [`qdrant`](crate::qdrant).

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{StoreStats, VectorStore};

/// An in-memory [`VectorStore`] using cosine similarity for search.
#[derive(Debug)]
pub struct InMemoryVectorStore {
    dimensions: usize,
    records: RwLock<HashMap<String, Chunk>>,
}

impl InMemoryVectorStore {
    /// Create an empty store for vectors of the given dimension.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions, records: RwLock::new(HashMap::new()) }
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn upsert(&self, chunks: &[Chunk]) -> Result<usize> {
        for chunk in chunks {
            if chunk.embedding.len() != self.dimensions {
                return Err(RagError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: chunk.embedding.len(),
                });
            }
        }

        let mut records = self.records.write().await;
        for chunk in chunks {
            records.insert(Uuid::new_v4().to_string(), chunk.clone());
        }
        Ok(chunks.len())
    }

    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        if embedding.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }

        let records = self.records.read().await;
        let mut scored: Vec<SearchResult> = records
            .values()
            .map(|chunk| {
                let score = cosine_similarity(&chunk.embedding, embedding);
                SearchResult { chunk: chunk.clone(), score }
            })
            .filter(|r| r.score >= min_score)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(top_k);
        Ok(scored)
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        let mut records = self.records.write().await;
        records.retain(|_, chunk| chunk.document_id != document_id);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut records = self.records.write().await;
        records.clear();
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let records = self.records.read().await;
        Ok(StoreStats { record_count: records.len() })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_with_embedding(id: &str, document_id: &str, embedding: Vec<f32>) -> Chunk {
        Chunk {
            id: id.to_string(),
            text: format!("text for {id}"),
            position: 0,
            embedding,
            metadata: HashMap::new(),
            document_id: document_id.to_string(),
        }
    }

    #[tokio::test]
    async fn upsert_rejects_wrong_dimension() {
        let store = InMemoryVectorStore::new(3);
        let err = store
            .upsert(&[chunk_with_embedding("c0", "d0", vec![1.0, 0.0])])
            .await
            .unwrap_err();
        assert!(matches!(err, RagError::DimensionMismatch { expected: 3, actual: 2 }));
    }

    #[tokio::test]
    async fn search_filters_below_min_score() {
        let store = InMemoryVectorStore::new(2);
        store
            .upsert(&[
                chunk_with_embedding("close", "d0", vec![1.0, 0.0]),
                chunk_with_embedding("far", "d0", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        let results = store.search(&[1.0, 0.0], 10, 0.5).await.unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].chunk.id, "close");
        assert!(results[0].score >= 0.5);
    }

    #[tokio::test]
    async fn delete_document_removes_only_that_document() {
        let store = InMemoryVectorStore::new(2);
        store
            .upsert(&[
                chunk_with_embedding("a0", "doc-a", vec![1.0, 0.0]),
                chunk_with_embedding("a1", "doc-a", vec![0.9, 0.1]),
                chunk_with_embedding("b0", "doc-b", vec![0.0, 1.0]),
            ])
            .await
            .unwrap();

        store.delete_document("doc-a").await.unwrap();
        let stats = store.stats().await.unwrap();
        assert_eq!(stats.record_count, 1);
    }

    #[tokio::test]
    async fn clear_empties_the_collection() {
        let store = InMemoryVectorStore::new(2);
        store.upsert(&[chunk_with_embedding("c0", "d0", vec![1.0, 0.0])]).await.unwrap();
        store.clear().await.unwrap();
        assert_eq!(store.stats().await.unwrap().record_count, 0);
    }

    #[test]
    fn cosine_of_zero_vector_is_zero() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
