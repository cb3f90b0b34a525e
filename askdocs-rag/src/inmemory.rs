//! In-memory vector store using cosine similarity.
//!
//! [`InMemoryVectorStore`] backs collections with `HashMap`s behind a
//! `tokio::sync::RwLock`. It is the test substitute for the hosted backend
//! (the pipeline takes the store as an injected dependency for exactly this
//! reason) and works for small single-process deployments.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::document::{Chunk, SearchResult, StoreStats};
use crate::error::{RagError, Result};
use crate::vectorstore::{SearchFilter, VectorStore};

#[derive(Debug, Default)]
struct Collection {
    chunks: HashMap<Uuid, Chunk>,
    /// Every document id ever upserted, so absence can be asserted.
    documents_seen: HashSet<Uuid>,
}

/// An in-memory [`VectorStore`] using cosine similarity for search.
///
/// Searching a collection that was never created returns an empty result,
/// matching the contract that emptiness is not an error; upserting into one
/// is an error.
#[derive(Debug, Default)]
pub struct InMemoryVectorStore {
    collections: RwLock<HashMap<String, Collection>>,
}

impl InMemoryVectorStore {
    /// Create a new empty in-memory vector store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl VectorStore for InMemoryVectorStore {
    async fn create_collection(&self, name: &str, _dimensions: usize) -> Result<()> {
        let mut collections = self.collections.write().await;
        collections.entry(name.to_string()).or_default();
        Ok(())
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        let mut collections = self.collections.write().await;
        let store =
            collections.get_mut(collection).ok_or_else(|| RagError::VectorStoreUnavailable {
                backend: "in-memory".to_string(),
                message: format!("collection '{collection}' does not exist"),
            })?;
        for chunk in chunks {
            store.documents_seen.insert(chunk.document_id);
            store.chunks.insert(chunk.id, chunk.clone());
        }
        Ok(())
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
        filter: Option<SearchFilter>,
    ) -> Result<Vec<SearchResult>> {
        let collections = self.collections.read().await;
        let Some(store) = collections.get(collection) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<SearchResult> = store
            .chunks
            .values()
            .filter(|chunk| match filter {
                Some(f) => chunk.document_id == f.document_id,
                None => true,
            })
            .map(|chunk| {
                let score = cosine_similarity(&chunk.embedding, embedding);
                SearchResult { chunk: chunk.clone(), score }
            })
            .collect();

        // Stable sort: equal scores keep their original order.
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);
        Ok(scored)
    }

    async fn stats(&self, collection: &str) -> Result<StoreStats> {
        let collections = self.collections.read().await;
        let Some(store) = collections.get(collection) else {
            return Ok(StoreStats { total_documents: 0, total_chunks: 0 });
        };
        let total_documents =
            store.chunks.values().map(|c| c.document_id).collect::<HashSet<_>>().len();
        Ok(StoreStats { total_documents, total_chunks: store.chunks.len() })
    }

    async fn contains_document(&self, collection: &str, document_id: Uuid) -> Result<Option<bool>> {
        let collections = self.collections.read().await;
        let Some(store) = collections.get(collection) else {
            return Ok(Some(false));
        };
        Ok(Some(store.documents_seen.contains(&document_id)))
    }
}
