//! Error types for the `askdocs-rag` crate.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur in the document Q&A pipeline.
#[derive(Debug, Error)]
pub enum RagError {
    /// A caller-supplied argument was malformed (empty query, bad chunking
    /// parameters, unsupported file content). Never retried automatically.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// An error occurred during embedding generation.
    #[error("Embedding error ({provider}): {message}")]
    Embedding {
        /// The embedding provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// The vector store backend is unreachable or returned an error.
    ///
    /// Distinct from an empty search result: this kind is retryable and is
    /// never silently converted into a "no results" answer.
    #[error("Vector store unavailable ({backend}): {message}")]
    VectorStoreUnavailable {
        /// The vector store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// The language-model provider failed or timed out while formatting an
    /// answer. Distinct from a zero-result answer.
    #[error("Generation error ({provider}): {message}")]
    Generation {
        /// The language-model provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A query was scoped to a document id the store has never seen.
    #[error("Document not found: {0}")]
    NotFound(Uuid),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for pipeline operations.
pub type Result<T> = std::result::Result<T, RagError>;
