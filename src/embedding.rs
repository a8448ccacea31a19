//! Embedding provider trait for generating vector embeddings from text.

use async_trait::async_trait;

use crate::error::Result;

/// A provider that generates vector embeddings from text input.
///
/// Implementations wrap specific embedding backends behind a unified async
/// interface. Document and query embedding are separate entry points
/// because some providers use a task-specific encoding for queries; the
/// default [`embed_query`](EmbeddingProvider::embed_query) implementation
/// delegates to [`embed_documents`](EmbeddingProvider::embed_documents).
///
/// # Example
///
/// ```rust,ignore
/// use ragline::EmbeddingProvider;
///
/// let provider = MyEmbeddingProvider::new();
/// let vectors = provider.embed_documents(&["hello", "world"]).await?;
/// assert_eq!(vectors[0].len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate embedding vectors for a batch of document texts,
    /// preserving input order.
    ///
    /// An empty input yields an empty output without touching the backend.
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>>;

    /// Generate an embedding vector for a query.
    ///
    /// Providers with a query-specific encoding should override this.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        let mut results = self.embed_documents(&[text]).await?;
        Ok(results.pop().unwrap_or_default())
    }

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}
