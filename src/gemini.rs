//! Gemini embedding provider using the Generative Language REST API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};

/// Base URL for the Generative Language API.
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default embedding model.
const DEFAULT_MODEL: &str = "text-embedding-004";

/// The default output dimensionality.
const DEFAULT_DIMENSIONS: usize = 768;

/// The default number of texts sent per batch request.
const DEFAULT_BATCH_SIZE: usize = 100;

/// An [`EmbeddingProvider`] backed by the Gemini embedding API.
///
/// Documents are embedded through `batchEmbedContents` with the
/// `RETRIEVAL_DOCUMENT` task type, batched to limit latency and rate-limit
/// exposure; queries go through `embedContent` with `RETRIEVAL_QUERY`.
///
/// # Configuration
///
/// - `model` - defaults to `text-embedding-004`.
/// - `dimensions` - requested output dimensionality, defaults to 768.
/// - `batch_size` - texts per batch request, defaults to 100.
/// - `api_key` - from the constructor or the `GOOGLE_API_KEY` environment
///   variable.
///
/// # Example
///
/// ```rust,ignore
/// use ragline::GeminiEmbedder;
///
/// let embedder = GeminiEmbedder::from_env()?;
/// let vector = embedder.embed_query("what is chunk overlap?").await?;
/// assert_eq!(vector.len(), 768);
/// ```
pub struct GeminiEmbedder {
    client: reqwest::Client,
    api_key: String,
    model: String,
    dimensions: usize,
    batch_size: usize,
}

impl GeminiEmbedder {
    /// Create a new provider with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Embedding {
                provider: "Gemini".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.into(),
            dimensions: DEFAULT_DIMENSIONS,
            batch_size: DEFAULT_BATCH_SIZE,
        })
    }

    /// Create a new provider using the `GOOGLE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY").map_err(|_| RagError::Embedding {
            provider: "Gemini".into(),
            message: "GOOGLE_API_KEY environment variable not set".into(),
        })?;
        Self::new(api_key)
    }

    /// Set the embedding model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the requested output dimensionality.
    ///
    /// This also updates the value returned by
    /// [`dimensions()`](EmbeddingProvider::dimensions).
    pub fn with_dimensions(mut self, dims: usize) -> Self {
        self.dimensions = dims;
        self
    }

    /// Set the number of texts sent per batch request.
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    fn request_error(e: reqwest::Error) -> RagError {
        error!(provider = "Gemini", error = %e, "embedding request failed");
        RagError::Embedding { provider: "Gemini".into(), message: format!("request failed: {e}") }
    }

    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ApiErrorResponse>(&body)
            .map(|e| e.error.message)
            .unwrap_or(body);

        error!(provider = "Gemini", %status, "embedding API error");
        Err(RagError::Embedding {
            provider: "Gemini".into(),
            message: format!("API returned {status}: {detail}"),
        })
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
struct ContentPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<ContentPart<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EmbedRequest<'a> {
    model: String,
    content: Content<'a>,
    task_type: &'a str,
    output_dimensionality: usize,
}

#[derive(Serialize)]
struct BatchEmbedRequest<'a> {
    requests: Vec<EmbedRequest<'a>>,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: EmbeddingValues,
}

#[derive(Deserialize)]
struct BatchEmbedResponse {
    embeddings: Vec<EmbeddingValues>,
}

#[derive(Deserialize)]
struct EmbeddingValues {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

// ── EmbeddingProvider implementation ───────────────────────────────

#[async_trait]
impl EmbeddingProvider for GeminiEmbedder {
    async fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{GEMINI_BASE_URL}/models/{}:batchEmbedContents", self.model);
        let mut vectors = Vec::with_capacity(texts.len());

        for batch in texts.chunks(self.batch_size) {
            debug!(
                provider = "Gemini",
                batch_size = batch.len(),
                model = %self.model,
                "embedding document batch"
            );

            let request_body = BatchEmbedRequest {
                requests: batch
                    .iter()
                    .map(|&text| EmbedRequest {
                        model: format!("models/{}", self.model),
                        content: Content { parts: vec![ContentPart { text }] },
                        task_type: "RETRIEVAL_DOCUMENT",
                        output_dimensionality: self.dimensions,
                    })
                    .collect(),
            };

            let response = self
                .client
                .post(&url)
                .header("x-goog-api-key", &self.api_key)
                .json(&request_body)
                .send()
                .await
                .map_err(Self::request_error)?;
            let response = Self::check_status(response).await?;

            let parsed: BatchEmbedResponse = response.json().await.map_err(|e| {
                error!(provider = "Gemini", error = %e, "failed to parse batch response");
                RagError::Embedding {
                    provider: "Gemini".into(),
                    message: format!("failed to parse response: {e}"),
                }
            })?;

            if parsed.embeddings.len() != batch.len() {
                return Err(RagError::Embedding {
                    provider: "Gemini".into(),
                    message: format!(
                        "API returned {} embeddings for {} inputs",
                        parsed.embeddings.len(),
                        batch.len()
                    ),
                });
            }

            vectors.extend(parsed.embeddings.into_iter().map(|e| e.values));
        }

        Ok(vectors)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Gemini", text_len = text.len(), "embedding query");

        let url = format!("{GEMINI_BASE_URL}/models/{}:embedContent", self.model);
        let request_body = EmbedRequest {
            model: format!("models/{}", self.model),
            content: Content { parts: vec![ContentPart { text }] },
            task_type: "RETRIEVAL_QUERY",
            output_dimensionality: self.dimensions,
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(Self::request_error)?;
        let response = Self::check_status(response).await?;

        let parsed: EmbedResponse = response.json().await.map_err(|e| {
            error!(provider = "Gemini", error = %e, "failed to parse query response");
            RagError::Embedding {
                provider: "Gemini".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        Ok(parsed.embedding.values)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}
