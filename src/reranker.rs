//! Reranker trait for re-scoring search results.

use async_trait::async_trait;

use crate::document::SearchResult;
use crate::error::Result;

/// A reranker that re-scores and reorders search candidates.
///
/// Implementations can use cross-encoder services, LLM-based scoring, or
/// other strategies to improve precision beyond initial vector similarity.
/// The pipeline selects one implementation at construction; when reranking
/// is disabled it installs [`SimilarityReranker`] instead of branching per
/// query.
#[async_trait]
pub trait Reranker: Send + Sync {
    /// Rerank candidates given the original query, returning at most
    /// `top_n` results ordered by descending relevance.
    ///
    /// `top_n` is clamped to the candidate count.
    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<SearchResult>,
        top_n: usize,
    ) -> Result<Vec<SearchResult>>;
}

/// The strategy used when reranking is disabled: truncate the
/// similarity-ordered candidates to `top_n`, keeping similarity as the
/// final score.
///
/// Also the fallback ordering the pipeline applies when a configured
/// reranker fails.
///
/// # Example
///
/// ```rust,ignore
/// use ragline::{Reranker, SimilarityReranker};
///
/// let reranked = SimilarityReranker.rerank("query", candidates, 5).await?;
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SimilarityReranker;

#[async_trait]
impl Reranker for SimilarityReranker {
    async fn rerank(
        &self,
        _query: &str,
        mut candidates: Vec<SearchResult>,
        top_n: usize,
    ) -> Result<Vec<SearchResult>> {
        candidates.truncate(top_n);
        Ok(candidates)
    }
}
