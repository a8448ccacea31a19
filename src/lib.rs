//! # ragline
//!
//! A retrieval-augmented generation pipeline: ingest text, split it into
//! overlapping chunks, embed the chunks, store and search the vectors by
//! cosine similarity, rerank the candidates, and assemble a
//! citation-grounded prompt for an external language model.
//!
//! ## Overview
//!
//! Ingestion runs `text → chunks → vectors → stored records`; a query runs
//! `query → query vector → top-k candidates → reranked top-n → numbered
//! context → grounded answer`. Every stage sits behind a trait so backends
//! are swappable and tests run without network access:
//!
//! - [`Chunker`] / [`RecursiveChunker`] - cascading paragraph → sentence →
//!   character splitting with overlap
//! - [`EmbeddingProvider`] / [`GeminiEmbedder`] - text to fixed-dimension
//!   vectors
//! - [`VectorStore`] / [`QdrantVectorStore`] / [`InMemoryVectorStore`] -
//!   persistence and similarity search
//! - [`Reranker`] / [`JinaReranker`] / [`SimilarityReranker`] - second-stage
//!   relevance ordering
//! - [`AnswerGenerator`] / [`GeminiGenerator`] - grounded answer generation
//! - [`RagPipeline`] - the orchestrator tying the stages together
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use ragline::{Document, InMemoryVectorStore, RagConfig, RagPipeline, RecursiveChunker};
//!
//! # async fn run(embedder: Arc<dyn ragline::EmbeddingProvider>) -> ragline::Result<()> {
//! let config = RagConfig::default();
//! let pipeline = RagPipeline::builder()
//!     .config(config.clone())
//!     .chunker(Arc::new(RecursiveChunker::from_config(&config)))
//!     .embedder(embedder.clone())
//!     .vector_store(Arc::new(InMemoryVectorStore::new(embedder.dimensions())))
//!     .build()?;
//!
//! pipeline.ingest(&Document::new("some text").with_source("notes.txt")).await?;
//! let results = pipeline.retrieve("what do the notes say?").await?;
//! # Ok(())
//! # }
//! ```
//!
//! Reranking is selected once at construction: pass a [`JinaReranker`] (or
//! any [`Reranker`]) to the builder, or omit it to truncate by similarity.
//! If a configured reranker fails at query time the pipeline degrades to
//! similarity order instead of failing the query.

pub mod chunking;
pub mod citation;
pub mod config;
pub mod document;
pub mod embedding;
pub mod error;
pub mod extract;
pub mod gemini;
pub mod inmemory;
pub mod jina;
pub mod llm;
pub mod pipeline;
#[cfg(feature = "qdrant")]
pub mod qdrant;
pub mod reranker;
pub mod vectorstore;

pub use chunking::{Chunker, RecursiveChunker};
pub use citation::{CitedSource, Confidence, build_context, confidence_from_scores};
pub use config::{RagConfig, RagConfigBuilder};
pub use document::{Chunk, Document, SearchResult};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use extract::extract_text;
pub use gemini::GeminiEmbedder;
pub use inmemory::InMemoryVectorStore;
pub use jina::JinaReranker;
pub use llm::{AnswerGenerator, GeminiGenerator, answer_prompt, estimate_cost_usd, estimate_tokens};
pub use pipeline::{
    IngestReport, NO_MATCH_ANSWER, QueryResponse, RagPipeline, RagPipelineBuilder, RetrievalStats,
    Timings, TokenStats,
};
#[cfg(feature = "qdrant")]
pub use qdrant::QdrantVectorStore;
pub use reranker::{Reranker, SimilarityReranker};
pub use vectorstore::{StoreStats, VectorStore};
