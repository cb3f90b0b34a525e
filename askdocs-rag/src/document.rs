//! Data types for documents, chunks, and search results.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A source document uploaded by a client.
///
/// Created once on upload and immutable thereafter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Document {
    /// Unique identifier for the document.
    pub id: Uuid,
    /// Original filename as uploaded.
    pub filename: String,
    /// The full extracted text content.
    pub text: String,
    /// When the document was uploaded.
    pub uploaded_at: DateTime<Utc>,
    /// Key-value metadata supplied at upload time (description, tags, ...).
    pub metadata: HashMap<String, String>,
}

impl Document {
    /// Create a document with a fresh id and the current timestamp.
    pub fn new(filename: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            text: text.into(),
            uploaded_at: Utc::now(),
            metadata: HashMap::new(),
        }
    }

    /// Attach upload metadata.
    pub fn with_metadata(mut self, metadata: HashMap<String, String>) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A contiguous slice of a [`Document`]'s text with its vector embedding.
///
/// Chunks are created in batch when a document is ingested and never mutated
/// afterwards. `sequence_index` is contiguous from 0 in original text order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Unique identifier for the chunk.
    pub id: Uuid,
    /// The id of the parent [`Document`].
    pub document_id: Uuid,
    /// Filename of the parent document, kept denormalized for result sources.
    pub filename: String,
    /// Position of this chunk within its document, starting at 0.
    pub sequence_index: usize,
    /// The text content of the chunk.
    pub text: String,
    /// The vector embedding for this chunk's text. Empty until embedded.
    pub embedding: Vec<f32>,
    /// Metadata inherited from the parent document.
    pub metadata: HashMap<String, String>,
}

/// A retrieved [`Chunk`] paired with a similarity score.
///
/// Ephemeral: produced per query, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// The retrieved chunk (embedding omitted by backends that do not return it).
    pub chunk: Chunk,
    /// The similarity score (higher is more relevant).
    pub score: f32,
}

/// Counts reported by [`VectorStore::stats`](crate::vectorstore::VectorStore::stats).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreStats {
    /// Number of distinct documents with at least one stored chunk.
    pub total_documents: usize,
    /// Number of stored chunks across all documents.
    pub total_chunks: usize,
}
