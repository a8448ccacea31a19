//! Jina reranker client using the Jina AI rerank API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::document::SearchResult;
use crate::error::{RagError, Result};
use crate::reranker::Reranker;

/// The default Jina rerank API endpoint.
const JINA_RERANK_URL: &str = "https://api.jina.ai/v1/rerank";

/// The default cross-encoder model.
const DEFAULT_MODEL: &str = "jina-reranker-v2-base-multilingual";

/// A [`Reranker`] backed by the Jina AI cross-encoder API.
///
/// Sends the query and candidate texts to the rerank endpoint and maps the
/// returned `(index, relevance_score)` pairs back onto the input
/// candidates, replacing their scores.
///
/// # Configuration
///
/// - `model` - defaults to `jina-reranker-v2-base-multilingual`.
/// - `endpoint` - defaults to the hosted Jina API.
/// - `api_key` - from the constructor or the `JINA_API_KEY` environment
///   variable.
///
/// # Example
///
/// ```rust,ignore
/// use ragline::JinaReranker;
///
/// let reranker = JinaReranker::from_env()?;
/// let reranked = reranker.rerank("query", candidates, 5).await?;
/// ```
pub struct JinaReranker {
    client: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl JinaReranker {
    /// Create a new reranker with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Reranker {
                provider: "Jina".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.into(),
            endpoint: JINA_RERANK_URL.into(),
        })
    }

    /// Create a new reranker using the `JINA_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("JINA_API_KEY").map_err(|_| RagError::Reranker {
            provider: "Jina".into(),
            message: "JINA_API_KEY environment variable not set".into(),
        })?;
        Self::new(api_key)
    }

    /// Set the reranker model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the rerank endpoint (self-hosted deployments).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

// ── Jina API request/response types ────────────────────────────────

#[derive(Serialize)]
struct RerankRequest<'a> {
    model: &'a str,
    query: &'a str,
    documents: Vec<&'a str>,
    top_n: usize,
}

#[derive(Deserialize)]
struct RerankResponse {
    results: Vec<RerankEntry>,
}

#[derive(Deserialize)]
struct RerankEntry {
    index: usize,
    relevance_score: f32,
}

// ── Reranker implementation ────────────────────────────────────────

#[async_trait]
impl Reranker for JinaReranker {
    async fn rerank(
        &self,
        query: &str,
        candidates: Vec<SearchResult>,
        top_n: usize,
    ) -> Result<Vec<SearchResult>> {
        if candidates.is_empty() {
            return Ok(candidates);
        }

        let documents: Vec<&str> = candidates.iter().map(|c| c.chunk.text.as_str()).collect();
        let request_body = RerankRequest {
            model: &self.model,
            query,
            documents,
            top_n: top_n.min(candidates.len()),
        };

        debug!(
            provider = "Jina",
            candidates = candidates.len(),
            top_n = request_body.top_n,
            "reranking candidates"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Jina", error = %e, "rerank request failed");
                RagError::Reranker {
                    provider: "Jina".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = "Jina", %status, "rerank API error");
            return Err(RagError::Reranker {
                provider: "Jina".into(),
                message: format!("API returned {status}: {body}"),
            });
        }

        let parsed: RerankResponse = response.json().await.map_err(|e| {
            error!(provider = "Jina", error = %e, "failed to parse rerank response");
            RagError::Reranker {
                provider: "Jina".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        let mut reranked = Vec::with_capacity(parsed.results.len());
        for entry in parsed.results {
            let candidate =
                candidates.get(entry.index).ok_or_else(|| RagError::Reranker {
                    provider: "Jina".into(),
                    message: format!("API returned out-of-range index {}", entry.index),
                })?;
            reranked
                .push(SearchResult { chunk: candidate.chunk.clone(), score: entry.relevance_score });
        }

        Ok(reranked)
    }
}
