//! Pipeline orchestrator.
//!
//! [`RagPipeline`] coordinates the full ingest-and-query workflow by
//! composing a [`Chunker`], an [`EmbeddingProvider`], a [`VectorStore`],
//! a [`Reranker`], and an optional [`AnswerGenerator`].
//!
//! # Example
//!
//! ```rust,ignore
//! use ragline::{
//!     Document, GeminiEmbedder, GeminiGenerator, JinaReranker, QdrantVectorStore, RagConfig,
//!     RagPipeline, RecursiveChunker,
//! };
//!
//! let config = RagConfig::from_env()?;
//! let embedder = Arc::new(GeminiEmbedder::from_env()?);
//! let store = Arc::new(
//!     QdrantVectorStore::connect(&url, api_key, "knowledge_base", embedder.dimensions()).await?,
//! );
//!
//! let pipeline = RagPipeline::builder()
//!     .config(config.clone())
//!     .chunker(Arc::new(RecursiveChunker::from_config(&config)))
//!     .embedder(embedder)
//!     .vector_store(store)
//!     .reranker(Arc::new(JinaReranker::from_env()?))
//!     .answer_generator(Arc::new(GeminiGenerator::from_env()?))
//!     .build()?;
//!
//! pipeline.ingest(&Document::new(text).with_source("notes.txt")).await?;
//! let response = pipeline.query("what does the note say?").await?;
//! ```

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::chunking::Chunker;
use crate::citation::{CitedSource, Confidence, build_context, confidence_from_scores};
use crate::config::RagConfig;
use crate::document::{Document, SearchResult};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::llm::{AnswerGenerator, answer_prompt, estimate_cost_usd, estimate_tokens};
use crate::reranker::{Reranker, SimilarityReranker};
use crate::vectorstore::{StoreStats, VectorStore};

/// The fixed answer returned when no candidate clears the similarity
/// threshold. The pipeline skips the LLM call entirely in that case.
pub const NO_MATCH_ANSWER: &str =
    "I couldn't find any relevant information in the knowledge base to answer your question.";

/// Outcome of a document ingestion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestReport {
    /// Id of the ingested document.
    pub document_id: String,
    /// Number of chunks embedded and stored.
    pub chunks_added: usize,
    /// Wall-clock time for the full chunk-embed-store sequence.
    pub elapsed_seconds: f64,
}

/// Per-stage wall-clock timings for a query, in seconds.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Timings {
    /// Query embedding plus similarity search.
    pub retrieval: f64,
    /// Reranking (zero when the no-match short-circuit fires).
    pub reranking: f64,
    /// Answer generation (zero when skipped).
    pub generation: f64,
    /// End-to-end time.
    pub total: f64,
}

/// Estimated token usage for a query.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenStats {
    /// Estimated tokens in the assembled prompt.
    pub prompt_tokens: usize,
    /// Estimated tokens in the generated answer.
    pub completion_tokens: usize,
    /// Sum of prompt and completion tokens.
    pub total_tokens: usize,
}

/// Candidate counts through the two retrieval stages.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetrievalStats {
    /// Candidates returned by similarity search.
    pub initial_retrieved: usize,
    /// Candidates remaining after reranking/truncation.
    pub after_reranking: usize,
}

/// A grounded answer with citations and bookkeeping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// The generated answer, or [`NO_MATCH_ANSWER`] on the short-circuit.
    pub answer: String,
    /// Citations in rank order, parallel to the `[n]` markers in the
    /// context the answer was grounded on.
    pub sources: Vec<CitedSource>,
    /// Coarse confidence label for the answer.
    pub confidence: Confidence,
    /// Per-stage timings.
    pub timings: Timings,
    /// Estimated token usage.
    pub token_stats: TokenStats,
    /// Estimated API cost in USD.
    pub estimated_cost_usd: f64,
    /// Candidate counts through the retrieval stages.
    pub retrieval_stats: RetrievalStats,
}

struct RetrievalOutcome {
    initial: usize,
    results: Vec<SearchResult>,
    retrieval_secs: f64,
    rerank_secs: f64,
}

/// The pipeline orchestrator.
///
/// Ingestion runs chunk → embed → store; queries run embed → search →
/// rerank → context assembly → generation. Construct one via
/// [`RagPipeline::builder()`]. All components are shared immutably, so a
/// pipeline can serve concurrent requests from behind an `Arc`.
pub struct RagPipeline {
    config: RagConfig,
    chunker: Arc<dyn Chunker>,
    embedder: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn VectorStore>,
    reranker: Arc<dyn Reranker>,
    generator: Option<Arc<dyn AnswerGenerator>>,
}

impl std::fmt::Debug for RagPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RagPipeline")
            .field("config", &self.config)
            .field("has_generator", &self.generator.is_some())
            .finish_non_exhaustive()
    }
}

impl RagPipeline {
    /// Create a new [`RagPipelineBuilder`].
    pub fn builder() -> RagPipelineBuilder {
        RagPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &RagConfig {
        &self.config
    }

    /// Return a reference to the vector store.
    pub fn vector_store(&self) -> &Arc<dyn VectorStore> {
        &self.store
    }

    /// Ingest a single document: chunk → embed → store.
    ///
    /// Stages run sequentially with no partial-result suppression: if a
    /// later batch fails, work already committed by earlier batches
    /// remains in the store.
    ///
    /// # Errors
    ///
    /// Propagates [`RagError::InvalidInput`] from the chunker,
    /// [`RagError::Embedding`] from the provider, and
    /// [`RagError::StoreUnavailable`] / [`RagError::DimensionMismatch`]
    /// from the store.
    pub async fn ingest(&self, document: &Document) -> Result<IngestReport> {
        let started = Instant::now();

        let mut chunks = self.chunker.chunk(document)?;
        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();

        let embeddings = self.embedder.embed_documents(&texts).await.inspect_err(
            |e| error!(document_id = %document.id, error = %e, "embedding failed during ingestion"),
        )?;
        if embeddings.len() != chunks.len() {
            return Err(RagError::Pipeline(format!(
                "embedder returned {} vectors for {} chunks",
                embeddings.len(),
                chunks.len()
            )));
        }
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let chunks_added = self.store.upsert(&chunks).await.inspect_err(
            |e| error!(document_id = %document.id, error = %e, "upsert failed during ingestion"),
        )?;

        let elapsed_seconds = started.elapsed().as_secs_f64();
        info!(document_id = %document.id, chunks_added, elapsed_seconds, "ingested document");

        Ok(IngestReport { document_id: document.id.clone(), chunks_added, elapsed_seconds })
    }

    /// Ingest an uploaded file: extract text, then [`ingest`](Self::ingest)
    /// with `source` and `title` set to the filename.
    ///
    /// # Errors
    ///
    /// Additionally returns [`RagError::FileTooLarge`] and
    /// [`RagError::UnsupportedFormat`] from extraction.
    pub async fn ingest_file(&self, filename: &str, bytes: &[u8]) -> Result<IngestReport> {
        let text = crate::extract::extract_text(filename, bytes, self.config.max_file_bytes)?;
        let document = Document::new(text).with_source(filename).with_title(filename);
        self.ingest(&document).await
    }

    /// Retrieve the final ranked candidates for a query.
    ///
    /// Embeds the query, searches the store with the configured `top_k`
    /// and similarity threshold, then reranks down to `top_k_rerank`.
    /// Returns an empty sequence (not an error) when nothing clears the
    /// threshold. A reranker failure degrades to similarity order rather
    /// than failing the query.
    pub async fn retrieve(&self, query: &str) -> Result<Vec<SearchResult>> {
        let outcome = self.retrieve_inner(query).await?;
        info!(
            initial = outcome.initial,
            final_count = outcome.results.len(),
            "retrieval completed"
        );
        Ok(outcome.results)
    }

    async fn retrieve_inner(&self, query: &str) -> Result<RetrievalOutcome> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidInput("query is empty".to_string()));
        }

        let started = Instant::now();
        let query_embedding = self
            .embedder
            .embed_query(query)
            .await
            .inspect_err(|e| error!(error = %e, "query embedding failed"))?;

        let candidates = self
            .store
            .search(
                &query_embedding,
                self.config.top_k_retrieval,
                self.config.similarity_threshold,
            )
            .await
            .inspect_err(|e| error!(error = %e, "similarity search failed"))?;
        let retrieval_secs = started.elapsed().as_secs_f64();
        let initial = candidates.len();

        if candidates.is_empty() {
            return Ok(RetrievalOutcome {
                initial,
                results: Vec::new(),
                retrieval_secs,
                rerank_secs: 0.0,
            });
        }

        let rerank_started = Instant::now();
        let top_n = self.config.top_k_rerank.min(candidates.len());
        let results = match self.reranker.rerank(query, candidates.clone(), top_n).await {
            Ok(results) => results,
            Err(e) => {
                // Fail open: degrade to similarity order instead of
                // failing the whole query.
                warn!(error = %e, "reranker failed, falling back to similarity order");
                let mut fallback = candidates;
                fallback.truncate(top_n);
                fallback
            }
        };

        Ok(RetrievalOutcome {
            initial,
            results,
            retrieval_secs,
            rerank_secs: rerank_started.elapsed().as_secs_f64(),
        })
    }

    /// Answer a question against the knowledge base.
    ///
    /// Runs [`retrieve`](Self::retrieve), assembles the citation-numbered
    /// context, and asks the configured [`AnswerGenerator`] for a grounded
    /// answer. When retrieval comes back empty the call short-circuits to
    /// [`NO_MATCH_ANSWER`] with empty citations and low confidence, and no
    /// LLM call is made.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if no answer generator was configured,
    /// plus any retrieval failure and [`RagError::Llm`] from generation.
    pub async fn query(&self, query: &str) -> Result<QueryResponse> {
        let generator = self.generator.as_ref().ok_or_else(|| {
            RagError::Config("query requires an answer generator; none configured".to_string())
        })?;

        let total_started = Instant::now();
        let outcome = self.retrieve_inner(query).await?;
        let mut timings = Timings {
            retrieval: outcome.retrieval_secs,
            reranking: outcome.rerank_secs,
            generation: 0.0,
            total: 0.0,
        };

        if outcome.results.is_empty() {
            timings.total = total_started.elapsed().as_secs_f64();
            info!("no candidates above threshold, skipping generation");
            return Ok(QueryResponse {
                answer: NO_MATCH_ANSWER.to_string(),
                sources: Vec::new(),
                confidence: Confidence::Low,
                timings,
                token_stats: TokenStats::default(),
                estimated_cost_usd: 0.0,
                retrieval_stats: RetrievalStats {
                    initial_retrieved: outcome.initial,
                    after_reranking: 0,
                },
            });
        }

        let (context, sources) = build_context(&outcome.results);
        let prompt = answer_prompt(query, &context);

        let generation_started = Instant::now();
        let answer = generator
            .generate(&prompt)
            .await
            .inspect_err(|e| error!(error = %e, "answer generation failed"))?;
        timings.generation = generation_started.elapsed().as_secs_f64();
        timings.total = total_started.elapsed().as_secs_f64();

        let scores: Vec<f32> = outcome.results.iter().map(|r| r.score).collect();
        let confidence = confidence_from_scores(
            &scores,
            self.config.confidence_high,
            self.config.confidence_medium,
        );

        let prompt_tokens = estimate_tokens(&prompt);
        let completion_tokens = estimate_tokens(&answer);

        info!(
            sources = sources.len(),
            %confidence,
            total_seconds = timings.total,
            "query completed"
        );

        Ok(QueryResponse {
            answer,
            sources,
            confidence,
            timings,
            token_stats: TokenStats {
                prompt_tokens,
                completion_tokens,
                total_tokens: prompt_tokens + completion_tokens,
            },
            estimated_cost_usd: estimate_cost_usd(prompt_tokens, completion_tokens),
            retrieval_stats: RetrievalStats {
                initial_retrieved: outcome.initial,
                after_reranking: outcome.results.len(),
            },
        })
    }

    /// Delete all chunks belonging to one document.
    pub async fn delete_document(&self, document_id: &str) -> Result<()> {
        self.store.delete_document(document_id).await
    }

    /// Irreversibly remove every record from the knowledge base.
    pub async fn clear(&self) -> Result<()> {
        self.store.clear().await
    }

    /// Return knowledge-base statistics.
    pub async fn stats(&self) -> Result<StoreStats> {
        self.store.stats().await
    }
}

/// Builder for constructing a [`RagPipeline`].
///
/// `config`, `chunker`, `embedder`, and `vector_store` are required.
/// Without a `reranker`, [`SimilarityReranker`] is installed, selecting
/// the truncation strategy once at construction. The `answer_generator`
/// is only required by [`RagPipeline::query`].
#[derive(Default)]
pub struct RagPipelineBuilder {
    config: Option<RagConfig>,
    chunker: Option<Arc<dyn Chunker>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    store: Option<Arc<dyn VectorStore>>,
    reranker: Option<Arc<dyn Reranker>>,
    generator: Option<Arc<dyn AnswerGenerator>>,
}

impl RagPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: RagConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the embedding provider.
    pub fn embedder(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the reranker. Omit to disable reranking (similarity-order
    /// truncation).
    pub fn reranker(mut self, reranker: Arc<dyn Reranker>) -> Self {
        self.reranker = Some(reranker);
        self
    }

    /// Set the answer generator used by [`RagPipeline::query`].
    pub fn answer_generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the [`RagPipeline`], validating required components and that
    /// the embedder and store agree on the vector dimension.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if a required component is missing,
    /// or [`RagError::DimensionMismatch`] if the embedder's output
    /// dimension differs from the store's collection dimension. The
    /// mismatch is fatal here so a misconfigured deployment never serves
    /// traffic.
    pub fn build(self) -> Result<RagPipeline> {
        let config =
            self.config.ok_or_else(|| RagError::Config("config is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::Config("chunker is required".to_string()))?;
        let embedder =
            self.embedder.ok_or_else(|| RagError::Config("embedder is required".to_string()))?;
        let store =
            self.store.ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;

        if embedder.dimensions() == 0 {
            return Err(RagError::Config("embedder reports zero dimensions".to_string()));
        }
        if embedder.dimensions() != store.dimensions() {
            return Err(RagError::DimensionMismatch {
                expected: store.dimensions(),
                actual: embedder.dimensions(),
            });
        }

        let reranker = self.reranker.unwrap_or_else(|| Arc::new(SimilarityReranker));

        Ok(RagPipeline {
            config,
            chunker,
            embedder,
            store,
            reranker,
            generator: self.generator,
        })
    }
}
