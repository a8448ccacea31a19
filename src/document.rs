//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A source document containing text content and metadata.
///
/// Documents are transient: they exist only for the duration of an ingest
/// call. Only their chunks are persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: String,
    /// The text content of the document.
    pub text: String,
    /// Key-value metadata carried onto every chunk of this document.
    pub metadata: HashMap<String, String>,
    /// Optional URI pointing to the original source.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_uri: Option<String>,
}

impl Document {
    /// Create a document with a fresh v4 uuid id and empty metadata.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            text: text.into(),
            metadata: HashMap::new(),
            source_uri: None,
        }
    }

    /// Attach a free-form source identifier (stored under the `source` key).
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.metadata.insert("source".to_string(), source.into());
        self
    }

    /// Attach a title (stored under the `title` key).
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.metadata.insert("title".to_string(), title.into());
        self
    }

    /// Merge additional metadata entries into the document.
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata.extend(metadata);
        self
    }
}

/// A segment of a [`Document`]: the atomic unit of embedding and retrieval.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk, `{document_id}_{position}`.
    pub id: String,
    /// The text content of the chunk.
    pub text: String,
    /// Zero-based index of this chunk within its source document.
    pub position: usize,
    /// The vector embedding for this chunk's text. Empty until the
    /// pipeline attaches one.
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document plus chunk-specific
    /// fields (`position`, `total_chunks`, `token_count`). Carried through
    /// storage and returned verbatim on retrieval.
    pub metadata: HashMap<String, String>,
    /// The ID of the parent [`Document`].
    pub document_id: String,
}

/// A retrieved [`Chunk`] paired with a relevance score.
///
/// Produced by similarity search ordered by descending similarity; after
/// reranking, `score` holds the rerank score, which supersedes similarity
/// for final ordering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk.
    pub chunk: Chunk,
    /// The relevance score (higher is more relevant).
    pub score: f32,
}
