//! Answer generation against the Gemini completion API.
//!
//! The pipeline itself only assembles the grounded prompt; the actual
//! completion call goes through the [`AnswerGenerator`] trait so callers
//! can plug in any provider (or a mock in tests).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::error::{RagError, Result};

/// Base URL for the Generative Language API.
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The default completion model.
const DEFAULT_MODEL: &str = "gemini-2.0-flash";

/// The default sampling temperature, kept low for grounded answering.
const DEFAULT_TEMPERATURE: f32 = 0.3;

/// Attempts made against a rate-limited completion endpoint.
const MAX_ATTEMPTS: u32 = 3;

/// A provider that generates an answer from an assembled prompt.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate a completion for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Rough token estimation: four characters per token.
pub fn estimate_tokens(text: &str) -> usize {
    text.len() / 4
}

/// Estimated API cost in USD for a prompt/completion token split, using
/// the reference per-1K-character input ($0.00025) and output ($0.0005)
/// rates.
pub fn estimate_cost_usd(prompt_tokens: usize, completion_tokens: usize) -> f64 {
    let input_cost = (prompt_tokens * 4) as f64 / 1000.0 * 0.00025;
    let output_cost = (completion_tokens * 4) as f64 / 1000.0 * 0.0005;
    input_cost + output_cost
}

/// Build the grounded answering prompt: context-only answering with inline
/// `[n]` citations referencing the numbered context blocks.
pub fn answer_prompt(query: &str, context: &str) -> String {
    format!(
        "You are a helpful assistant that answers questions based ONLY on the provided context.\n\
         \n\
         CONTEXT:\n\
         {context}\n\
         \n\
         INSTRUCTIONS:\n\
         1. Answer the question using ONLY information from the context above.\n\
         2. Use inline citations [1], [2], [3] etc. to reference the sources.\n\
         3. If the context doesn't contain enough information to fully answer the question, say so.\n\
         4. Be concise but comprehensive.\n\
         5. Do not make up information or use external knowledge.\n\
         \n\
         QUESTION: {query}\n\
         \n\
         ANSWER:"
    )
}

/// An [`AnswerGenerator`] backed by the Gemini `generateContent` API.
///
/// Retries rate-limited requests (HTTP 429) up to three attempts with a
/// linear backoff; every other failure surfaces immediately as
/// [`RagError::Llm`].
///
/// # Example
///
/// ```rust,ignore
/// use ragline::GeminiGenerator;
///
/// let generator = GeminiGenerator::from_env()?;
/// let answer = generator.generate(&prompt).await?;
/// ```
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiGenerator {
    /// Create a new generator with the given API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(RagError::Llm {
                provider: "Gemini".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            model: DEFAULT_MODEL.into(),
            temperature: DEFAULT_TEMPERATURE,
        })
    }

    /// Create a new generator using the `GOOGLE_API_KEY` environment variable.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GOOGLE_API_KEY").map_err(|_| RagError::Llm {
            provider: "Gemini".into(),
            message: "GOOGLE_API_KEY environment variable not set".into(),
        })?;
        Self::new(api_key)
    }

    /// Set the completion model name.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    async fn generate_once(&self, prompt: &str) -> Result<String> {
        let url = format!("{GEMINI_BASE_URL}/models/{}:generateContent", self.model);
        let request_body = GenerateRequest {
            contents: vec![RequestContent { parts: vec![RequestPart { text: prompt }] }],
            generation_config: GenerationConfig { temperature: self.temperature },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Gemini", error = %e, "completion request failed");
                RagError::Llm {
                    provider: "Gemini".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RagError::Llm {
                provider: "Gemini".into(),
                message: "rate limited (429)".into(),
            });
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(provider = "Gemini", %status, "completion API error");
            return Err(RagError::Llm {
                provider: "Gemini".into(),
                message: format!("API returned {status}: {body}"),
            });
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            error!(provider = "Gemini", error = %e, "failed to parse completion response");
            RagError::Llm {
                provider: "Gemini".into(),
                message: format!("failed to parse response: {e}"),
            }
        })?;

        let answer = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .unwrap_or_default();

        if answer.is_empty() {
            return Err(RagError::Llm {
                provider: "Gemini".into(),
                message: "API returned an empty completion".into(),
            });
        }

        Ok(answer)
    }

    fn is_rate_limit(error: &RagError) -> bool {
        matches!(error, RagError::Llm { message, .. } if message.contains("429"))
    }
}

// ── Gemini API request/response types ──────────────────────────────

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    #[serde(rename = "generationConfig")]
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<ResponseCandidate>,
}

#[derive(Deserialize)]
struct ResponseCandidate {
    content: ResponseContent,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

// ── AnswerGenerator implementation ─────────────────────────────────

#[async_trait]
impl AnswerGenerator for GeminiGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        debug!(provider = "Gemini", model = %self.model, prompt_len = prompt.len(), "generating answer");

        let mut last_error = None;
        for attempt in 1..=MAX_ATTEMPTS {
            match self.generate_once(prompt).await {
                Ok(answer) => return Ok(answer),
                Err(e) if Self::is_rate_limit(&e) && attempt < MAX_ATTEMPTS => {
                    let wait = Duration::from_secs(u64::from(attempt) * 5);
                    warn!(provider = "Gemini", attempt, wait_secs = wait.as_secs(), "rate limited, backing off");
                    tokio::time::sleep(wait).await;
                    last_error = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_error.unwrap_or_else(|| RagError::Llm {
            provider: "Gemini".into(),
            message: "generation failed".into(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_estimate_is_quarter_of_length() {
        assert_eq!(estimate_tokens("abcdefgh"), 2);
        assert_eq!(estimate_tokens(""), 0);
    }

    #[test]
    fn cost_scales_with_tokens() {
        let small = estimate_cost_usd(100, 50);
        let large = estimate_cost_usd(1000, 500);
        assert!(large > small);
        assert!((estimate_cost_usd(0, 0) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn prompt_embeds_query_and_context() {
        let prompt = answer_prompt("what is overlap?", "[1] chunk text\n");
        assert!(prompt.contains("QUESTION: what is overlap?"));
        assert!(prompt.contains("[1] chunk text"));
        assert!(prompt.contains("ONLY"));
    }
}
