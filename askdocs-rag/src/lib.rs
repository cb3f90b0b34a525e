//! # askdocs-rag
//!
//! The retrieval-and-answer pipeline behind the askdocs document Q&A
//! service: chunking, embedding storage with filtered similarity search, and
//! query answering with scoped→global fallback, near-duplicate compression,
//! and blocking or streamed answer formatting.
//!
//! External collaborators (embedding model, vector database, language model)
//! sit behind the [`EmbeddingProvider`], [`VectorStore`], and
//! [`AnswerFormatter`] traits; production wiring uses the OpenAI providers
//! and the Qdrant store, tests the in-memory store and fakes.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use askdocs_rag::{
//!     BoundaryChunker, InMemoryVectorStore, PipelineConfig, QaPipeline,
//! };
//!
//! let config = PipelineConfig::default();
//! let pipeline = QaPipeline::builder()
//!     .config(config.clone())
//!     .embedding_provider(Arc::new(embedder))
//!     .vector_store(Arc::new(InMemoryVectorStore::new()))
//!     .chunker(Arc::new(BoundaryChunker::new(config.chunk_size, config.chunk_overlap)?))
//!     .formatter(Arc::new(formatter))
//!     .build()?;
//!
//! pipeline.init().await?;
//! let receipt = pipeline.ingest(&document).await?;
//! let answer = pipeline.answer("what is X", None, Some(receipt.document_id)).await?;
//! ```

pub mod chunking;
pub mod config;
pub mod dedup;
pub mod document;
pub mod embedding;
pub mod error;
pub mod generation;
pub mod inmemory;
pub mod openai;
pub mod pipeline;
pub mod qdrant;
pub mod vectorstore;

pub use chunking::{BoundaryChunker, Chunker};
pub use config::{PipelineConfig, PipelineConfigBuilder};
pub use document::{Chunk, Document, SearchResult, StoreStats};
pub use embedding::EmbeddingProvider;
pub use error::{RagError, Result};
pub use generation::{AnswerFormatter, AnswerFragmentStream, NO_RESULTS_MESSAGE};
pub use inmemory::InMemoryVectorStore;
pub use openai::{OpenAIAnswerFormatter, OpenAIEmbeddingProvider};
pub use pipeline::{
    Answer, AnswerStream, IngestReceipt, QaPipeline, QaPipelineBuilder, RetrievalSummary,
    SearchType,
};
pub use qdrant::QdrantVectorStore;
pub use vectorstore::{SearchFilter, VectorStore};
