//! Configuration for the retrieval pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{RagError, Result};

/// Configuration parameters for the retrieval pipeline.
///
/// Immutable once built; pass a clone into each component at construction.
/// Provider credentials and endpoints are configured on the providers
/// themselves, not here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RagConfig {
    /// Maximum chunk size, in approximate token units (characters / 4).
    /// The splitter operates on a character budget of `chunk_size` units.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks as a fraction of `chunk_size`.
    pub overlap_fraction: f32,
    /// Number of candidates fetched by similarity search.
    pub top_k_retrieval: usize,
    /// Number of candidates kept after reranking.
    pub top_k_rerank: usize,
    /// Minimum similarity score for search results.
    ///
    /// The default (0.3) is tuned for small corpora and trades precision
    /// for recall; 0.7 or higher is recommended at scale.
    pub similarity_threshold: f32,
    /// Average final score at or above which confidence is `High`.
    pub confidence_high: f32,
    /// Average final score at or above which confidence is `Medium`.
    pub confidence_medium: f32,
    /// Maximum accepted size for file ingestion, in bytes.
    pub max_file_bytes: usize,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            overlap_fraction: 0.15,
            top_k_retrieval: 10,
            top_k_rerank: 5,
            similarity_threshold: 0.3,
            confidence_high: 0.8,
            confidence_medium: 0.6,
            max_file_bytes: 10 * 1024 * 1024,
        }
    }
}

impl RagConfig {
    /// Create a new builder for constructing a [`RagConfig`].
    pub fn builder() -> RagConfigBuilder {
        RagConfigBuilder::default()
    }

    /// Load configuration from `RAG_*` environment variables, falling back
    /// to defaults for any variable that is unset.
    ///
    /// Recognized variables: `RAG_CHUNK_SIZE`, `RAG_OVERLAP_FRACTION`,
    /// `RAG_TOP_K_RETRIEVAL`, `RAG_TOP_K_RERANK`,
    /// `RAG_SIMILARITY_THRESHOLD`, `RAG_MAX_FILE_BYTES`.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a variable is set but unparseable,
    /// or if the resulting configuration fails validation.
    pub fn from_env() -> Result<Self> {
        let mut builder = Self::builder();
        if let Some(v) = env_parse::<usize>("RAG_CHUNK_SIZE")? {
            builder = builder.chunk_size(v);
        }
        if let Some(v) = env_parse::<f32>("RAG_OVERLAP_FRACTION")? {
            builder = builder.overlap_fraction(v);
        }
        if let Some(v) = env_parse::<usize>("RAG_TOP_K_RETRIEVAL")? {
            builder = builder.top_k_retrieval(v);
        }
        if let Some(v) = env_parse::<usize>("RAG_TOP_K_RERANK")? {
            builder = builder.top_k_rerank(v);
        }
        if let Some(v) = env_parse::<f32>("RAG_SIMILARITY_THRESHOLD")? {
            builder = builder.similarity_threshold(v);
        }
        if let Some(v) = env_parse::<usize>("RAG_MAX_FILE_BYTES")? {
            builder = builder.max_file_bytes(v);
        }
        builder.build()
    }

    /// Overlap between adjacent chunks in characters:
    /// `round(chunk_size * overlap_fraction)`.
    pub fn chunk_overlap(&self) -> usize {
        (self.chunk_size as f32 * self.overlap_fraction).round() as usize
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| RagError::Config(format!("could not parse {name}={raw}"))),
        Err(_) => Ok(None),
    }
}

/// Builder for constructing a validated [`RagConfig`].
#[derive(Debug, Clone, Default)]
pub struct RagConfigBuilder {
    config: RagConfig,
}

impl RagConfigBuilder {
    /// Set the maximum chunk size in approximate token units.
    pub fn chunk_size(mut self, size: usize) -> Self {
        self.config.chunk_size = size;
        self
    }

    /// Set the overlap between adjacent chunks as a fraction of the chunk size.
    pub fn overlap_fraction(mut self, fraction: f32) -> Self {
        self.config.overlap_fraction = fraction;
        self
    }

    /// Set the number of candidates fetched by similarity search.
    pub fn top_k_retrieval(mut self, k: usize) -> Self {
        self.config.top_k_retrieval = k;
        self
    }

    /// Set the number of candidates kept after reranking.
    pub fn top_k_rerank(mut self, n: usize) -> Self {
        self.config.top_k_rerank = n;
        self
    }

    /// Set the minimum similarity score for search results.
    pub fn similarity_threshold(mut self, threshold: f32) -> Self {
        self.config.similarity_threshold = threshold;
        self
    }

    /// Set the confidence heuristic cut points.
    pub fn confidence_thresholds(mut self, high: f32, medium: f32) -> Self {
        self.config.confidence_high = high;
        self.config.confidence_medium = medium;
        self
    }

    /// Set the maximum accepted file size for ingestion, in bytes.
    pub fn max_file_bytes(mut self, bytes: usize) -> Self {
        self.config.max_file_bytes = bytes;
        self
    }

    /// Build the [`RagConfig`], validating that parameters are consistent.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if:
    /// - `chunk_size == 0`
    /// - `overlap_fraction` is not in `[0, 1)`
    /// - `top_k_retrieval == 0` or `top_k_rerank == 0`
    /// - `similarity_threshold` is not in `[0, 1]`
    /// - `confidence_medium > confidence_high`
    pub fn build(self) -> Result<RagConfig> {
        let c = &self.config;
        if c.chunk_size == 0 {
            return Err(RagError::Config("chunk_size must be greater than zero".to_string()));
        }
        if !(0.0..1.0).contains(&c.overlap_fraction) {
            return Err(RagError::Config(format!(
                "overlap_fraction ({}) must be in [0, 1)",
                c.overlap_fraction
            )));
        }
        if c.top_k_retrieval == 0 {
            return Err(RagError::Config("top_k_retrieval must be greater than zero".to_string()));
        }
        if c.top_k_rerank == 0 {
            return Err(RagError::Config("top_k_rerank must be greater than zero".to_string()));
        }
        if !(0.0..=1.0).contains(&c.similarity_threshold) {
            return Err(RagError::Config(format!(
                "similarity_threshold ({}) must be in [0, 1]",
                c.similarity_threshold
            )));
        }
        if c.confidence_medium > c.confidence_high {
            return Err(RagError::Config(format!(
                "confidence_medium ({}) must not exceed confidence_high ({})",
                c.confidence_medium, c.confidence_high
            )));
        }
        Ok(self.config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = RagConfig::builder().build().unwrap();
        assert_eq!(config, RagConfig::default());
        assert_eq!(config.chunk_overlap(), 150);
    }

    #[test]
    fn rejects_zero_chunk_size() {
        assert!(RagConfig::builder().chunk_size(0).build().is_err());
    }

    #[test]
    fn rejects_full_overlap() {
        assert!(RagConfig::builder().overlap_fraction(1.0).build().is_err());
    }

    #[test]
    fn rejects_inverted_confidence_thresholds() {
        assert!(RagConfig::builder().confidence_thresholds(0.5, 0.9).build().is_err());
    }

    #[test]
    fn overlap_rounds_to_nearest() {
        let config = RagConfig::builder().chunk_size(10).overlap_fraction(0.25).build().unwrap();
        assert_eq!(config.chunk_overlap(), 3);
    }
}
