//! Error types for the `ragline` crate.

use thiserror::Error;

/// Errors that can occur in pipeline operations.
///
/// Variants fall into three groups: user-correctable input errors
/// ([`InvalidInput`](RagError::InvalidInput),
/// [`UnsupportedFormat`](RagError::UnsupportedFormat),
/// [`FileTooLarge`](RagError::FileTooLarge)), upstream provider failures
/// ([`Embedding`](RagError::Embedding), [`Llm`](RagError::Llm),
/// [`Reranker`](RagError::Reranker),
/// [`StoreUnavailable`](RagError::StoreUnavailable)), and configuration-level
/// failures ([`DimensionMismatch`](RagError::DimensionMismatch),
/// [`Config`](RagError::Config)) that should prevent a deployment from
/// serving traffic at all.
///
/// Messages never carry credentials or full endpoint URLs.
#[derive(Debug, Error)]
pub enum RagError {
    /// Malformed or empty request data. Safe to surface verbatim.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The embedding service failed (auth, quota, timeout, bad response).
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The answer-generation service failed.
    #[error("LLM error ({provider}): {message}")]
    Llm {
        /// The completion provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector store is unreachable or rejected the operation.
    ///
    /// Callers must not assume a retry will succeed.
    #[error("Vector store unavailable ({backend}): {message}")]
    StoreUnavailable {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A vector of the wrong width reached the store.
    ///
    /// A correctly configured deployment never produces this at runtime:
    /// the collection dimension is fixed at initialization and must match
    /// the embedder's output dimension.
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// The dimension the collection was created with.
        expected: usize,
        /// The dimension of the offending vector.
        actual: usize,
    },

    /// The reranking service failed.
    ///
    /// The pipeline catches this and falls back to similarity ordering;
    /// it only surfaces when calling a [`Reranker`](crate::Reranker)
    /// directly.
    #[error("Reranker error ({provider}): {message}")]
    Reranker {
        /// The reranker that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// File ingestion with an extension the crate cannot extract text from.
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// File ingestion over the configured size limit.
    #[error("File too large: {size} bytes (limit {limit})")]
    FileTooLarge {
        /// Size of the uploaded file in bytes.
        size: usize,
        /// The configured limit in bytes.
        limit: usize,
    },

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// An error in pipeline orchestration.
    #[error("Pipeline error: {0}")]
    Pipeline(String),
}

/// A convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, RagError>;
