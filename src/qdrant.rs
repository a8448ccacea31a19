//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements
//! [`VectorStore`](crate::VectorStore) using the
//! [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC.
//!
//! # Example
//!
//! ```rust,ignore
//! use ragline::QdrantVectorStore;
//!
//! let store = QdrantVectorStore::connect(
//!     "http://localhost:6334",
//!     None,
//!     "knowledge_base",
//!     768,
//! )
//! .await?;
//! store.upsert(&chunks).await?;
//! let results = store.search(&query_embedding, 10, 0.3).await?;
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointStruct,
    SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::debug;
use uuid::Uuid;

use crate::document::{Chunk, SearchResult};
use crate::error::{RagError, Result};
use crate::vectorstore::{StoreStats, VectorStore};

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
///
/// Bound to a single collection with cosine distance; the collection is
/// created on connect when missing, with the dimension fixed for its
/// lifetime. Chunk text and metadata are stored as point payload; every
/// upserted chunk gets a fresh uuid point id.
pub struct QdrantVectorStore {
    client: Qdrant,
    collection: String,
    dimensions: usize,
}

impl QdrantVectorStore {
    /// Connect to a Qdrant instance and ensure the collection exists.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::StoreUnavailable`] if the service is
    /// unreachable or collection creation fails.
    pub async fn connect(
        url: &str,
        api_key: Option<String>,
        collection: impl Into<String>,
        dimensions: usize,
    ) -> Result<Self> {
        let client = Qdrant::from_url(url).api_key(api_key).build().map_err(Self::map_err)?;
        let store = Self { client, collection: collection.into(), dimensions };
        store.ensure_collection().await?;
        Ok(store)
    }

    /// Create the collection with cosine distance if it does not exist.
    async fn ensure_collection(&self) -> Result<()> {
        let collections = self.client.list_collections().await.map_err(Self::map_err)?;
        let exists = collections.collections.iter().any(|c| c.name == self.collection);
        if exists {
            debug!(collection = %self.collection, "qdrant collection already exists");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(&self.collection).vectors_config(
                    VectorParamsBuilder::new(self.dimensions as u64, Distance::Cosine),
                ),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = %self.collection, dimensions = self.dimensions, "created qdrant collection");
        Ok(())
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::StoreUnavailable { backend: "qdrant".to_string(), message: e.to_string() }
    }

    /// Extract a string from a Qdrant payload value.
    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn upsert(&self, chunks: &[Chunk]) -> Result<usize> {
        if chunks.is_empty() {
            return Ok(0);
        }
        for chunk in chunks {
            if chunk.embedding.len() != self.dimensions {
                return Err(RagError::DimensionMismatch {
                    expected: self.dimensions,
                    actual: chunk.embedding.len(),
                });
            }
        }

        let points: Vec<PointStruct> = chunks
            .iter()
            .map(|chunk| {
                let mut payload_map = serde_json::Map::new();
                payload_map
                    .insert("text".to_string(), serde_json::Value::String(chunk.text.clone()));
                payload_map.insert(
                    "document_id".to_string(),
                    serde_json::Value::String(chunk.document_id.clone()),
                );
                payload_map
                    .insert("chunk_id".to_string(), serde_json::Value::String(chunk.id.clone()));
                let metadata_obj: serde_json::Map<String, serde_json::Value> = chunk
                    .metadata
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect();
                payload_map.insert("metadata".to_string(), serde_json::Value::Object(metadata_obj));

                let payload =
                    Payload::try_from(serde_json::Value::Object(payload_map)).unwrap_or_default();

                PointStruct::new(
                    Uuid::new_v4().to_string(),
                    chunk.embedding.clone(),
                    payload,
                )
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection = %self.collection, count = chunks.len(), "upserted chunks to qdrant");
        Ok(chunks.len())
    }

    async fn search(
        &self,
        embedding: &[f32],
        top_k: usize,
        min_score: f32,
    ) -> Result<Vec<SearchResult>> {
        if embedding.len() != self.dimensions {
            return Err(RagError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }

        let response = self
            .client
            .search_points(
                SearchPointsBuilder::new(&self.collection, embedding.to_vec(), top_k as u64)
                    .score_threshold(min_score)
                    .with_payload(true),
            )
            .await
            .map_err(Self::map_err)?;

        let results = response
            .result
            .into_iter()
            .map(|scored| {
                let text =
                    scored.payload.get("text").and_then(Self::extract_string).unwrap_or_default();
                let document_id = scored
                    .payload
                    .get("document_id")
                    .and_then(Self::extract_string)
                    .unwrap_or_default();
                let id = scored
                    .payload
                    .get("chunk_id")
                    .and_then(Self::extract_string)
                    .unwrap_or_default();

                let metadata: HashMap<String, String> = scored
                    .payload
                    .get("metadata")
                    .and_then(|v| match &v.kind {
                        Some(Kind::StructValue(s)) => Some(
                            s.fields
                                .iter()
                                .filter_map(|(k, v)| {
                                    Self::extract_string(v).map(|s| (k.clone(), s))
                                })
                                .collect(),
                        ),
                        _ => None,
                    })
                    .unwrap_or_default();

                let position =
                    metadata.get("position").and_then(|p| p.parse().ok()).unwrap_or_default();

                SearchResult {
                    chunk: Chunk {
                        id,
                        text,
                        position,
                        embedding: vec![],
                        metadata,
                        document_id,
                    },
                    score: scored.score,
                }
            })
            .collect();

        Ok(results)
    }

    async fn delete_document(&self, document_id: &str) -> Result<()> {
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(Filter::must([Condition::matches(
                        "document_id",
                        document_id.to_string(),
                    )]))
                    .wait(true),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = %self.collection, document_id, "deleted document from qdrant");
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.client.delete_collection(&self.collection).await.map_err(Self::map_err)?;
        self.ensure_collection().await?;
        debug!(collection = %self.collection, "cleared qdrant collection");
        Ok(())
    }

    async fn stats(&self) -> Result<StoreStats> {
        let info = self.client.collection_info(&self.collection).await.map_err(Self::map_err)?;
        let record_count =
            info.result.and_then(|r| r.points_count).unwrap_or_default() as usize;
        Ok(StoreStats { record_count })
    }
}
