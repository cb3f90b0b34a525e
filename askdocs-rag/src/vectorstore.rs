//! Vector store trait for storing and searching chunk embeddings.

use async_trait::async_trait;
use uuid::Uuid;

use crate::document::{Chunk, SearchResult, StoreStats};
use crate::error::Result;

/// Restricts a search to chunks belonging to one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchFilter {
    /// Only return chunks with this parent document id.
    pub document_id: Uuid,
}

/// A storage backend for chunk embeddings with similarity search.
///
/// The store exclusively owns chunk persistence; the pipeline only reads.
/// Backends are expected to be internally consistent under concurrent
/// uploads and queries — no coordination happens above this trait, so a
/// query issued immediately after an upsert to the same document sees the
/// new chunks only within the backend's own consistency window (eventual,
/// not strict).
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create a named collection. No-op if it already exists.
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()>;

    /// Upsert chunks into a collection. Chunks must have embeddings set.
    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()>;

    /// Search for the `k` most similar chunks to the given embedding,
    /// optionally restricted by `filter`.
    ///
    /// Returns at most `k` results ordered by descending similarity score;
    /// ties keep the backend's original return order. An empty collection or
    /// a filter matching nothing yields an empty `Vec`, never an error —
    /// errors mean the backend itself is unavailable.
    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
        filter: Option<SearchFilter>,
    ) -> Result<Vec<SearchResult>>;

    /// Count stored documents and chunks.
    async fn stats(&self, collection: &str) -> Result<StoreStats>;

    /// Whether any chunk of `document_id` was ever stored.
    ///
    /// `Ok(None)` means the backend cannot assert this cheaply; callers must
    /// then treat an empty scoped search as zero matches rather than a
    /// missing document.
    async fn contains_document(&self, collection: &str, document_id: Uuid) -> Result<Option<bool>> {
        let _ = (collection, document_id);
        Ok(None)
    }
}
