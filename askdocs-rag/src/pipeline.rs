//! Retrieval-and-answer pipeline orchestrator.
//!
//! [`QaPipeline`] coordinates the full workflow by composing an
//! [`EmbeddingProvider`], a [`VectorStore`], a [`Chunker`], and an
//! [`AnswerFormatter`]:
//!
//! - ingest: chunk → embed → upsert, tagged with the document id
//! - answer: embed query → scoped search with global fallback → near-duplicate
//!   compression → context assembly → answer formatting (blocking or streamed)
//!
//! All collaborators are injected, so tests substitute an in-memory store and
//! fake providers.

use std::sync::Arc;

use futures::stream;
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;

use crate::chunking::Chunker;
use crate::config::PipelineConfig;
use crate::dedup;
use crate::document::{Document, SearchResult, StoreStats};
use crate::embedding::EmbeddingProvider;
use crate::error::{RagError, Result};
use crate::generation::{AnswerFormatter, AnswerFragmentStream, NO_RESULTS_MESSAGE};
use crate::vectorstore::{SearchFilter, VectorStore};

/// Chunks per upsert call, so a mid-ingest failure can report progress.
const UPSERT_BATCH: usize = 64;

/// Which search produced the results for an answer.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SearchType {
    /// Results came from a search scoped to one document.
    Document,
    /// Results came from a search over all documents.
    Global,
}

/// The outcome of ingesting one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReceipt {
    /// Id assigned to the ingested document.
    pub document_id: Uuid,
    /// Filename of the ingested document.
    pub filename: String,
    /// Number of chunks created and stored.
    pub chunks_created: usize,
}

/// A complete answer to one query. Ephemeral, returned to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Answer {
    /// The original query.
    pub query: String,
    /// The formatted answer text.
    pub answer: String,
    /// Which search produced the underlying results.
    pub search_type: SearchType,
    /// Distinct source filenames in rank order of first appearance.
    pub sources: Vec<String>,
    /// Number of results surviving deduplication.
    pub total_results: usize,
}

/// Retrieval metadata delivered ahead of a streamed answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSummary {
    /// The original query.
    pub query: String,
    /// Which search produced the underlying results.
    pub search_type: SearchType,
    /// Distinct source filenames in rank order of first appearance.
    pub sources: Vec<String>,
    /// Number of results surviving deduplication.
    pub total_results: usize,
}

/// A streamed answer: retrieval metadata plus a lazy fragment sequence.
///
/// The fragment stream is single-consumption; dropping it cancels the
/// provider request, which is how client disconnects propagate upstream.
pub struct AnswerStream {
    /// Retrieval metadata, available before any fragment.
    pub summary: RetrievalSummary,
    /// Ordered, finite sequence of answer text fragments.
    pub fragments: AnswerFragmentStream,
}

/// Progress of the scoped-then-global search, kept as an explicit state so
/// the fallback rule stays auditable.
#[derive(Debug)]
enum SearchPhase {
    /// No search has run (no document scope was requested).
    NotSearched,
    /// The scoped search returned at least one result.
    ScopedHit(Vec<SearchResult>),
    /// The scoped search returned nothing; fall back to global.
    ScopedMiss,
}

/// What retrieval produced, before answer formatting.
struct Retrieval {
    results: Vec<SearchResult>,
    search_type: SearchType,
    sources: Vec<String>,
}

/// The document Q&A pipeline orchestrator.
///
/// Construct one via [`QaPipeline::builder()`]; call
/// [`init`](QaPipeline::init) once at startup to ensure the collection
/// exists.
pub struct QaPipeline {
    config: PipelineConfig,
    embedding_provider: Arc<dyn EmbeddingProvider>,
    vector_store: Arc<dyn VectorStore>,
    chunker: Arc<dyn Chunker>,
    formatter: Arc<dyn AnswerFormatter>,
}

impl QaPipeline {
    /// Create a new [`QaPipelineBuilder`].
    pub fn builder() -> QaPipelineBuilder {
        QaPipelineBuilder::default()
    }

    /// Return a reference to the pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Ensure the configured collection exists in the vector store.
    ///
    /// Called once at startup; the collection is created with the
    /// dimensionality reported by the embedding provider.
    pub async fn init(&self) -> Result<()> {
        let dimensions = self.embedding_provider.dimensions();
        self.vector_store.create_collection(&self.config.collection, dimensions).await
    }

    /// Ingest a document: chunk → embed → store.
    ///
    /// Chunks are upserted in batches; if the store fails mid-ingest, the
    /// error message reports how many chunks were stored versus attempted.
    ///
    /// # Errors
    ///
    /// [`RagError::InvalidArgument`] for empty text, and the underlying
    /// embedding or store error otherwise.
    pub async fn ingest(&self, document: &Document) -> Result<IngestReceipt> {
        if document.text.trim().is_empty() {
            return Err(RagError::InvalidArgument("document text is empty".to_string()));
        }

        let mut chunks = self.chunker.chunk(document);
        let attempted = chunks.len();

        let texts: Vec<&str> = chunks.iter().map(|c| c.text.as_str()).collect();
        let embeddings = self.embedding_provider.embed_batch(&texts).await.inspect_err(|e| {
            error!(document.id = %document.id, error = %e, "embedding failed during ingestion");
        })?;
        for (chunk, embedding) in chunks.iter_mut().zip(embeddings) {
            chunk.embedding = embedding;
        }

        let mut stored = 0;
        for batch in chunks.chunks(UPSERT_BATCH) {
            if let Err(e) = self.vector_store.upsert(&self.config.collection, batch).await {
                error!(document.id = %document.id, stored, attempted, error = %e, "upsert failed during ingestion");
                return Err(match e {
                    RagError::VectorStoreUnavailable { backend, message } => {
                        RagError::VectorStoreUnavailable {
                            backend,
                            message: format!(
                                "{message} (stored {stored} of {attempted} chunks for document '{}')",
                                document.id
                            ),
                        }
                    }
                    other => other,
                });
            }
            stored += batch.len();
        }

        info!(document.id = %document.id, chunk_count = stored, "ingested document");

        Ok(IngestReceipt {
            document_id: document.id,
            filename: document.filename.clone(),
            chunks_created: stored,
        })
    }

    /// Answer a query in one call.
    ///
    /// Zero retrieval results is not an error: the answer is the fixed
    /// no-results message with empty sources.
    pub async fn answer(
        &self,
        query: &str,
        k: Option<usize>,
        document_id: Option<Uuid>,
    ) -> Result<Answer> {
        let retrieval = self.retrieve(query, k, document_id).await?;

        if retrieval.results.is_empty() {
            return Ok(Answer {
                query: query.to_string(),
                answer: NO_RESULTS_MESSAGE.to_string(),
                search_type: retrieval.search_type,
                sources: Vec::new(),
                total_results: 0,
            });
        }

        let context = build_context(&retrieval.results);
        let answer = self.formatter.format(query, &context).await.inspect_err(|e| {
            error!(error = %e, "answer formatting failed");
        })?;

        info!(result_count = retrieval.results.len(), search_type = ?retrieval.search_type, "query answered");

        Ok(Answer {
            query: query.to_string(),
            answer,
            search_type: retrieval.search_type,
            sources: retrieval.sources,
            total_results: retrieval.results.len(),
        })
    }

    /// Answer a query as a fragment stream.
    ///
    /// Retrieval runs eagerly (so retrieval errors surface here, not
    /// mid-stream); formatting is streamed. With zero results the stream
    /// yields the fixed no-results message as its only fragment, so the
    /// concatenated stream always equals the blocking answer.
    pub async fn answer_stream(
        &self,
        query: &str,
        k: Option<usize>,
        document_id: Option<Uuid>,
    ) -> Result<AnswerStream> {
        let retrieval = self.retrieve(query, k, document_id).await?;

        let summary = RetrievalSummary {
            query: query.to_string(),
            search_type: retrieval.search_type,
            sources: retrieval.sources.clone(),
            total_results: retrieval.results.len(),
        };

        let fragments: AnswerFragmentStream = if retrieval.results.is_empty() {
            Box::pin(stream::iter([Ok(NO_RESULTS_MESSAGE.to_string())]))
        } else {
            let context = build_context(&retrieval.results);
            self.formatter.format_stream(query, &context).await.inspect_err(|e| {
                error!(error = %e, "streamed answer formatting failed");
            })?
        };

        Ok(AnswerStream { summary, fragments })
    }

    /// Count stored documents and chunks.
    pub async fn stats(&self) -> Result<StoreStats> {
        self.vector_store.stats(&self.config.collection).await
    }

    /// Embed the query, run the scoped-then-global search, and compress the
    /// results.
    async fn retrieve(
        &self,
        query: &str,
        k: Option<usize>,
        document_id: Option<Uuid>,
    ) -> Result<Retrieval> {
        if query.trim().is_empty() {
            return Err(RagError::InvalidArgument("query must not be empty".to_string()));
        }
        let k = k.unwrap_or(self.config.default_k);
        if k == 0 || k > self.config.max_k {
            return Err(RagError::InvalidArgument(format!(
                "k must be between 1 and {}",
                self.config.max_k
            )));
        }

        let query_embedding = self.embedding_provider.embed(query).await.inspect_err(|e| {
            error!(error = %e, "embedding failed during query");
        })?;

        let collection = &self.config.collection;

        let phase = match document_id {
            None => SearchPhase::NotSearched,
            Some(id) => {
                let scoped = self
                    .vector_store
                    .search(collection, &query_embedding, k, Some(SearchFilter { document_id: id }))
                    .await?;
                if scoped.is_empty() {
                    // NotFound only when the store can assert the id was
                    // never seen; otherwise this is a plain scoped miss.
                    if self.vector_store.contains_document(collection, id).await? == Some(false) {
                        return Err(RagError::NotFound(id));
                    }
                    SearchPhase::ScopedMiss
                } else {
                    SearchPhase::ScopedHit(scoped)
                }
            }
        };

        let (results, search_type) = match phase {
            SearchPhase::ScopedHit(results) => (results, SearchType::Document),
            SearchPhase::NotSearched | SearchPhase::ScopedMiss => {
                let global =
                    self.vector_store.search(collection, &query_embedding, k, None).await?;
                (global, SearchType::Global)
            }
        };

        let results = dedup::compress(results, self.config.dedup_threshold);
        let sources = distinct_sources(&results);

        Ok(Retrieval { results, search_type, sources })
    }
}

/// Concatenate surviving chunk texts in rank order, tagged with their source.
fn build_context(results: &[SearchResult]) -> String {
    results
        .iter()
        .map(|r| format!("[source: {}]\n{}", r.chunk.filename, r.chunk.text))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Distinct filenames in rank order of first appearance.
fn distinct_sources(results: &[SearchResult]) -> Vec<String> {
    let mut sources = Vec::new();
    for result in results {
        if !sources.contains(&result.chunk.filename) {
            sources.push(result.chunk.filename.clone());
        }
    }
    sources
}

/// Builder for constructing a [`QaPipeline`].
///
/// All collaborators are required. The configuration defaults to
/// [`PipelineConfig::default()`].
#[derive(Default)]
pub struct QaPipelineBuilder {
    config: Option<PipelineConfig>,
    embedding_provider: Option<Arc<dyn EmbeddingProvider>>,
    vector_store: Option<Arc<dyn VectorStore>>,
    chunker: Option<Arc<dyn Chunker>>,
    formatter: Option<Arc<dyn AnswerFormatter>>,
}

impl QaPipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, provider: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedding_provider = Some(provider);
        self
    }

    /// Set the vector store backend.
    pub fn vector_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.vector_store = Some(store);
        self
    }

    /// Set the document chunker.
    pub fn chunker(mut self, chunker: Arc<dyn Chunker>) -> Self {
        self.chunker = Some(chunker);
        self
    }

    /// Set the answer formatter.
    pub fn formatter(mut self, formatter: Arc<dyn AnswerFormatter>) -> Self {
        self.formatter = Some(formatter);
        self
    }

    /// Build the [`QaPipeline`], validating that all collaborators are set.
    ///
    /// # Errors
    ///
    /// Returns [`RagError::Config`] if any required field is missing.
    pub fn build(self) -> Result<QaPipeline> {
        let config = self.config.unwrap_or_default();
        let embedding_provider = self
            .embedding_provider
            .ok_or_else(|| RagError::Config("embedding_provider is required".to_string()))?;
        let vector_store = self
            .vector_store
            .ok_or_else(|| RagError::Config("vector_store is required".to_string()))?;
        let chunker =
            self.chunker.ok_or_else(|| RagError::Config("chunker is required".to_string()))?;
        let formatter =
            self.formatter.ok_or_else(|| RagError::Config("formatter is required".to_string()))?;

        Ok(QaPipeline { config, embedding_provider, vector_store, chunker, formatter })
    }
}
