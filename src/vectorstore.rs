//! Vector store trait for storing and searching chunk embeddings.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::document::{Chunk, SearchResult};
use crate::error::Result;

/// Statistics about a store's collection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of persisted vector records.
    pub record_count: usize,
}

/// A storage backend for chunk embeddings with cosine similarity search.
///
/// Each store instance is bound to a single collection whose dimension is
/// fixed at initialization and must match the embedder's output dimension.
/// Write contention resolves last-write-wins per record id at the backend.
///
/// # Example
///
/// ```rust,ignore
/// use ragline::{InMemoryVectorStore, VectorStore};
///
/// let store = InMemoryVectorStore::new(768);
/// store.upsert(&chunks).await?;
/// let results = store.search(&query_embedding, 10, 0.3).await?;
/// ```
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// The collection's vector dimension.
    fn dimensions(&self) -> usize;

    /// Insert chunks, generating a fresh record id per chunk (no dedup by
    /// content). Chunks must have embeddings set. Returns the number of
    /// records inserted.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::DimensionMismatch`](crate::RagError::DimensionMismatch)
    /// if any embedding's width differs from the collection's, or
    /// [`RagError::StoreUnavailable`](crate::RagError::StoreUnavailable)
    /// if the backend rejects the write.
    async fn upsert(&self, chunks: &[Chunk]) -> Result<usize>;

    /// Search for the `top_k` most similar chunks to the given embedding.
    ///
    /// Returns results ordered by descending similarity score; results
    /// scoring below `min_score` are excluded.
    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>>;

    /// Delete all chunks belonging to one document.
    async fn delete_document(&self, document_id: &str) -> Result<()>;

    /// Irreversibly remove every record in the collection. No soft delete,
    /// no undo.
    async fn clear(&self) -> Result<()>;

    /// Return collection statistics.
    async fn stats(&self) -> Result<StoreStats>;
}
