//! Qdrant vector store backend.
//!
//! Provides [`QdrantVectorStore`] which implements [`VectorStore`] using the
//! [qdrant-client](https://docs.rs/qdrant-client) crate over gRPC. Chunk text
//! and provenance are stored as point payload so search results can be
//! reassembled without a second lookup.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::qdrant::point_id::PointIdOptions;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CountPointsBuilder, CreateCollectionBuilder, Distance, Filter, PointStruct,
    ScrollPointsBuilder, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use qdrant_client::{Payload, Qdrant};
use tracing::debug;
use uuid::Uuid;

use crate::document::{Chunk, SearchResult, StoreStats};
use crate::error::{RagError, Result};
use crate::vectorstore::{SearchFilter, VectorStore};

/// Page size for the distinct-document scroll in [`VectorStore::stats`].
const SCROLL_PAGE: u32 = 256;

/// A [`VectorStore`] backed by [Qdrant](https://qdrant.tech/).
///
/// Collections use cosine distance. Every gRPC failure maps to
/// [`RagError::VectorStoreUnavailable`]; an empty result set is returned as
/// an empty `Vec`, never an error.
pub struct QdrantVectorStore {
    client: Qdrant,
}

impl QdrantVectorStore {
    /// Connect to Qdrant at the given URL with a bounded per-call timeout.
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Qdrant::from_url(url).timeout(timeout).build().map_err(Self::map_err)?;
        Ok(Self { client })
    }

    /// Create a store from an existing client.
    pub fn from_client(client: Qdrant) -> Self {
        Self { client }
    }

    fn map_err(e: qdrant_client::QdrantError) -> RagError {
        RagError::VectorStoreUnavailable { backend: "qdrant".to_string(), message: e.to_string() }
    }

    fn document_filter(document_id: Uuid) -> Filter {
        Filter::must([Condition::matches("document_id", document_id.to_string())])
    }

    fn extract_string(value: &QdrantValue) -> Option<String> {
        match &value.kind {
            Some(Kind::StringValue(s)) => Some(s.clone()),
            _ => None,
        }
    }

    fn extract_usize(value: &QdrantValue) -> Option<usize> {
        match &value.kind {
            Some(Kind::IntegerValue(i)) => usize::try_from(*i).ok(),
            Some(Kind::StringValue(s)) => s.parse().ok(),
            _ => None,
        }
    }

    fn payload_document_id(payload: &HashMap<String, QdrantValue>) -> Option<Uuid> {
        payload.get("document_id").and_then(Self::extract_string).and_then(|s| s.parse().ok())
    }

    fn chunk_from_payload(id: Uuid, payload: &HashMap<String, QdrantValue>) -> Chunk {
        let text = payload.get("text").and_then(Self::extract_string).unwrap_or_default();
        let filename = payload.get("filename").and_then(Self::extract_string).unwrap_or_default();
        let sequence_index =
            payload.get("sequence_index").and_then(Self::extract_usize).unwrap_or_default();
        let document_id = Self::payload_document_id(payload).unwrap_or_else(Uuid::nil);

        let metadata: HashMap<String, String> = payload
            .get("metadata")
            .and_then(|v| match &v.kind {
                Some(Kind::StructValue(s)) => Some(
                    s.fields
                        .iter()
                        .filter_map(|(k, v)| Self::extract_string(v).map(|s| (k.clone(), s)))
                        .collect(),
                ),
                _ => None,
            })
            .unwrap_or_default();

        Chunk { id, document_id, filename, sequence_index, text, embedding: Vec::new(), metadata }
    }
}

fn point_uuid(id: Option<&qdrant_client::qdrant::PointId>) -> Uuid {
    id.and_then(|pid| match &pid.point_id_options {
        Some(PointIdOptions::Uuid(s)) => s.parse().ok(),
        _ => None,
    })
    .unwrap_or_else(Uuid::nil)
}

#[async_trait]
impl VectorStore for QdrantVectorStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        let collections = self.client.list_collections().await.map_err(Self::map_err)?;
        if collections.collections.iter().any(|c| c.name == name) {
            debug!(collection = name, "qdrant collection already exists, skipping creation");
            return Ok(());
        }

        self.client
            .create_collection(
                CreateCollectionBuilder::new(name)
                    .vectors_config(VectorParamsBuilder::new(dimensions as u64, Distance::Cosine)),
            )
            .await
            .map_err(Self::map_err)?;

        debug!(collection = name, dimensions, "created qdrant collection");
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        if chunks.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = chunks
            .iter()
            .map(|chunk| {
                let mut payload_map = serde_json::Map::new();
                payload_map
                    .insert("text".to_string(), serde_json::Value::String(chunk.text.clone()));
                payload_map.insert(
                    "document_id".to_string(),
                    serde_json::Value::String(chunk.document_id.to_string()),
                );
                payload_map.insert(
                    "filename".to_string(),
                    serde_json::Value::String(chunk.filename.clone()),
                );
                payload_map.insert(
                    "sequence_index".to_string(),
                    serde_json::Value::from(chunk.sequence_index as u64),
                );
                let metadata_obj: serde_json::Map<String, serde_json::Value> = chunk
                    .metadata
                    .iter()
                    .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                    .collect();
                payload_map.insert("metadata".to_string(), serde_json::Value::Object(metadata_obj));

                let payload =
                    Payload::try_from(serde_json::Value::Object(payload_map)).unwrap_or_default();

                PointStruct::new(chunk.id.to_string(), chunk.embedding.clone(), payload)
            })
            .collect();

        self.client
            .upsert_points(UpsertPointsBuilder::new(collection, points).wait(true))
            .await
            .map_err(Self::map_err)?;

        debug!(collection, count = chunks.len(), "upserted chunks to qdrant");
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
        filter: Option<SearchFilter>,
    ) -> Result<Vec<SearchResult>> {
        let mut request = SearchPointsBuilder::new(collection, embedding.to_vec(), k as u64)
            .with_payload(true);
        if let Some(f) = filter {
            request = request.filter(Self::document_filter(f.document_id));
        }

        let response = self.client.search_points(request).await.map_err(Self::map_err)?;

        Ok(response
            .result
            .into_iter()
            .map(|scored| {
                let id = point_uuid(scored.id.as_ref());
                SearchResult {
                    chunk: Self::chunk_from_payload(id, &scored.payload),
                    score: scored.score,
                }
            })
            .collect())
    }

    async fn stats(&self, collection: &str) -> Result<StoreStats> {
        let counted = self
            .client
            .count(CountPointsBuilder::new(collection).exact(true))
            .await
            .map_err(Self::map_err)?;
        let total_chunks = counted.result.map(|r| r.count as usize).unwrap_or_default();

        // Qdrant has no distinct-count, so page through document ids.
        let mut documents: HashSet<Uuid> = HashSet::new();
        let mut offset: Option<qdrant_client::qdrant::PointId> = None;
        loop {
            let mut request =
                ScrollPointsBuilder::new(collection).limit(SCROLL_PAGE).with_payload(true);
            if let Some(next) = offset.take() {
                request = request.offset(next);
            }
            let page = self.client.scroll(request).await.map_err(Self::map_err)?;
            for point in &page.result {
                if let Some(id) = Self::payload_document_id(&point.payload) {
                    documents.insert(id);
                }
            }
            match page.next_page_offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        Ok(StoreStats { total_documents: documents.len(), total_chunks })
    }

    async fn contains_document(&self, collection: &str, document_id: Uuid) -> Result<Option<bool>> {
        let counted = self
            .client
            .count(
                CountPointsBuilder::new(collection)
                    .filter(Self::document_filter(document_id))
                    .exact(true),
            )
            .await
            .map_err(Self::map_err)?;
        Ok(Some(counted.result.map(|r| r.count > 0).unwrap_or(false)))
    }
}
