//! Pipeline behavior: scoped→global routing, deduplication, the zero-result
//! answer, error-kind separation, and stream/blocking equivalence.

use std::collections::HashMap;
use std::sync::Arc;

use askdocs_rag::chunking::BoundaryChunker;
use askdocs_rag::config::PipelineConfig;
use askdocs_rag::document::{Chunk, Document, SearchResult, StoreStats};
use askdocs_rag::embedding::EmbeddingProvider;
use askdocs_rag::error::{RagError, Result};
use askdocs_rag::generation::{AnswerFormatter, AnswerFragmentStream, NO_RESULTS_MESSAGE};
use askdocs_rag::inmemory::InMemoryVectorStore;
use askdocs_rag::pipeline::{QaPipeline, SearchType};
use askdocs_rag::vectorstore::{SearchFilter, VectorStore};
use async_trait::async_trait;
use futures::{StreamExt, stream};
use uuid::Uuid;

// ── Fakes ───────────────────────────────────────────────────────────

/// Deterministic embedder: one axis per keyword, a spare axis for the rest.
struct KeywordEmbedder;

const KEYWORDS: [&str; 3] = ["alpha", "beta", "gamma"];

#[async_trait]
impl EmbeddingProvider for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let lowered = text.to_lowercase();
        let mut v = vec![0.0f32; 4];
        for (i, keyword) in KEYWORDS.iter().enumerate() {
            v[i] = lowered.matches(keyword).count() as f32;
        }
        if v.iter().all(|x| *x == 0.0) {
            v[3] = 1.0;
        }
        Ok(v)
    }

    fn dimensions(&self) -> usize {
        4
    }
}

fn render(query: &str, context: &str) -> String {
    format!("Answer[{query}] from {} bytes of context", context.len())
}

/// Formatter whose streamed output always concatenates to its blocking output.
struct EchoFormatter;

#[async_trait]
impl AnswerFormatter for EchoFormatter {
    async fn format(&self, query: &str, context: &str) -> Result<String> {
        Ok(render(query, context))
    }

    async fn format_stream(&self, query: &str, context: &str) -> Result<AnswerFragmentStream> {
        let full = render(query, context);
        let fragments: Vec<Result<String>> = full
            .as_bytes()
            .chunks(7)
            .map(|b| Ok(String::from_utf8_lossy(b).into_owned()))
            .collect();
        Ok(Box::pin(stream::iter(fragments)))
    }
}

/// Formatter that always fails, to check error-kind separation.
struct FailingFormatter;

fn generation_error() -> RagError {
    RagError::Generation { provider: "fake".to_string(), message: "model offline".to_string() }
}

#[async_trait]
impl AnswerFormatter for FailingFormatter {
    async fn format(&self, _query: &str, _context: &str) -> Result<String> {
        Err(generation_error())
    }

    async fn format_stream(&self, _query: &str, _context: &str) -> Result<AnswerFragmentStream> {
        Err(generation_error())
    }
}

/// Store that is scoped-blind: filtered searches miss, and it cannot assert
/// document presence, so the pipeline must fall back to global search.
struct ScopedMissStore {
    inner: InMemoryVectorStore,
}

#[async_trait]
impl VectorStore for ScopedMissStore {
    async fn create_collection(&self, name: &str, dimensions: usize) -> Result<()> {
        self.inner.create_collection(name, dimensions).await
    }

    async fn upsert(&self, collection: &str, chunks: &[Chunk]) -> Result<()> {
        self.inner.upsert(collection, chunks).await
    }

    async fn search(
        &self,
        collection: &str,
        embedding: &[f32],
        k: usize,
        filter: Option<SearchFilter>,
    ) -> Result<Vec<SearchResult>> {
        if filter.is_some() {
            return Ok(Vec::new());
        }
        self.inner.search(collection, embedding, k, None).await
    }

    async fn stats(&self, collection: &str) -> Result<StoreStats> {
        self.inner.stats(collection).await
    }

    async fn contains_document(
        &self,
        _collection: &str,
        _document_id: Uuid,
    ) -> Result<Option<bool>> {
        Ok(None)
    }
}

/// Store whose backend is down.
struct UnavailableStore;

fn unavailable() -> RagError {
    RagError::VectorStoreUnavailable {
        backend: "fake".to_string(),
        message: "connection refused".to_string(),
    }
}

#[async_trait]
impl VectorStore for UnavailableStore {
    async fn create_collection(&self, _name: &str, _dimensions: usize) -> Result<()> {
        Err(unavailable())
    }

    async fn upsert(&self, _collection: &str, _chunks: &[Chunk]) -> Result<()> {
        Err(unavailable())
    }

    async fn search(
        &self,
        _collection: &str,
        _embedding: &[f32],
        _k: usize,
        _filter: Option<SearchFilter>,
    ) -> Result<Vec<SearchResult>> {
        Err(unavailable())
    }

    async fn stats(&self, _collection: &str) -> Result<StoreStats> {
        Err(unavailable())
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn pipeline_with(
    store: Arc<dyn VectorStore>,
    formatter: Arc<dyn AnswerFormatter>,
) -> QaPipeline {
    let config = PipelineConfig::default();
    QaPipeline::builder()
        .config(config.clone())
        .embedding_provider(Arc::new(KeywordEmbedder))
        .vector_store(store)
        .chunker(Arc::new(
            BoundaryChunker::new(config.chunk_size, config.chunk_overlap).unwrap(),
        ))
        .formatter(formatter)
        .build()
        .unwrap()
}

fn echo_pipeline(store: Arc<dyn VectorStore>) -> QaPipeline {
    pipeline_with(store, Arc::new(EchoFormatter))
}

async fn ingest(pipeline: &QaPipeline, filename: &str, text: &str) -> Uuid {
    let document = Document::new(filename, text);
    pipeline.ingest(&document).await.unwrap().document_id
}

// ── Tests ───────────────────────────────────────────────────────────

#[tokio::test]
async fn scoped_query_uses_document_search_and_stays_in_scope() {
    let pipeline = echo_pipeline(Arc::new(InMemoryVectorStore::new()));
    pipeline.init().await.unwrap();

    let alpha_id = ingest(&pipeline, "alpha.txt", "alpha alpha alpha facts").await;
    let _beta_id = ingest(&pipeline, "beta.txt", "beta beta beta facts").await;

    let answer = pipeline.answer("tell me about alpha", Some(5), Some(alpha_id)).await.unwrap();

    assert_eq!(answer.search_type, SearchType::Document);
    assert_eq!(answer.sources, vec!["alpha.txt".to_string()]);
    assert!(answer.total_results >= 1);
}

#[tokio::test]
async fn scoped_miss_falls_back_to_global() {
    let pipeline = echo_pipeline(Arc::new(ScopedMissStore { inner: InMemoryVectorStore::new() }));
    pipeline.init().await.unwrap();

    let doc_id = ingest(&pipeline, "alpha.txt", "alpha alpha alpha facts").await;

    let answer = pipeline.answer("tell me about alpha", Some(5), Some(doc_id)).await.unwrap();

    assert_eq!(answer.search_type, SearchType::Global);
    assert_eq!(answer.sources, vec!["alpha.txt".to_string()]);
}

#[tokio::test]
async fn unknown_document_id_is_not_found_when_store_can_assert() {
    let pipeline = echo_pipeline(Arc::new(InMemoryVectorStore::new()));
    pipeline.init().await.unwrap();
    ingest(&pipeline, "alpha.txt", "alpha alpha alpha facts").await;

    let missing = Uuid::new_v4();
    let err = pipeline.answer("tell me about alpha", Some(5), Some(missing)).await.unwrap_err();
    assert!(matches!(err, RagError::NotFound(id) if id == missing));
}

#[tokio::test]
async fn zero_results_yield_fixed_message_not_error() {
    let pipeline = echo_pipeline(Arc::new(InMemoryVectorStore::new()));
    pipeline.init().await.unwrap();

    let answer = pipeline.answer("what is delta", None, None).await.unwrap();

    assert_eq!(answer.answer, NO_RESULTS_MESSAGE);
    assert_eq!(answer.search_type, SearchType::Global);
    assert!(answer.sources.is_empty());
    assert_eq!(answer.total_results, 0);
}

#[tokio::test]
async fn near_duplicate_chunks_are_compressed() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = echo_pipeline(store.clone());
    pipeline.init().await.unwrap();

    // Two overlapping chunks surfacing nearly identical content, one distinct.
    let doc_id = Uuid::new_v4();
    let shared: Vec<String> = (0..19).map(|i| format!("alpha{i}")).collect();
    let make = |sequence_index: usize, text: String, embedding: Vec<f32>| Chunk {
        id: Uuid::new_v4(),
        document_id: doc_id,
        filename: "alpha.txt".to_string(),
        sequence_index,
        text,
        embedding,
        metadata: HashMap::new(),
    };
    store
        .upsert(
            "documents",
            &[
                make(0, format!("alpha {}", shared.join(" ")), vec![1.0, 0.0, 0.0, 0.0]),
                make(1, format!("alpha {}", shared.join(" ")), vec![0.9, 0.0, 0.0, 0.1]),
                make(2, "alpha but entirely different content".to_string(), vec![0.8, 0.0, 0.0, 0.2]),
            ],
        )
        .await
        .unwrap();

    let answer = pipeline.answer("alpha", Some(5), None).await.unwrap();

    assert_eq!(answer.total_results, 2);
    assert_eq!(answer.sources, vec!["alpha.txt".to_string()]);
}

#[tokio::test]
async fn streamed_answer_concatenates_to_blocking_answer() {
    let pipeline = echo_pipeline(Arc::new(InMemoryVectorStore::new()));
    pipeline.init().await.unwrap();
    let doc_id = ingest(&pipeline, "alpha.txt", "alpha alpha alpha facts").await;

    let blocking = pipeline.answer("alpha", Some(5), Some(doc_id)).await.unwrap();
    let streamed = pipeline.answer_stream("alpha", Some(5), Some(doc_id)).await.unwrap();

    assert_eq!(streamed.summary.search_type, blocking.search_type);
    assert_eq!(streamed.summary.sources, blocking.sources);
    assert_eq!(streamed.summary.total_results, blocking.total_results);

    let fragments: Vec<String> =
        streamed.fragments.map(|f| f.unwrap()).collect::<Vec<_>>().await;
    assert!(!fragments.is_empty());
    assert_eq!(fragments.concat(), blocking.answer);
}

#[tokio::test]
async fn zero_result_stream_yields_the_fixed_message_then_ends() {
    let pipeline = echo_pipeline(Arc::new(InMemoryVectorStore::new()));
    pipeline.init().await.unwrap();

    let streamed = pipeline.answer_stream("anything", None, None).await.unwrap();
    assert_eq!(streamed.summary.total_results, 0);

    let fragments: Vec<String> =
        streamed.fragments.map(|f| f.unwrap()).collect::<Vec<_>>().await;
    assert_eq!(fragments, vec![NO_RESULTS_MESSAGE.to_string()]);
}

#[tokio::test]
async fn generation_failure_is_not_the_no_results_answer() {
    let store = Arc::new(InMemoryVectorStore::new());
    let pipeline = pipeline_with(store, Arc::new(FailingFormatter));
    pipeline.init().await.unwrap();
    ingest(&pipeline, "alpha.txt", "alpha alpha alpha facts").await;

    let err = pipeline.answer("alpha", None, None).await.unwrap_err();
    assert!(matches!(err, RagError::Generation { .. }));
}

#[tokio::test]
async fn store_failure_is_surfaced_not_swallowed() {
    let pipeline = echo_pipeline(Arc::new(UnavailableStore));

    let err = pipeline.answer("alpha", None, None).await.unwrap_err();
    assert!(matches!(err, RagError::VectorStoreUnavailable { .. }));
}

#[tokio::test]
async fn malformed_queries_are_invalid_arguments() {
    let pipeline = echo_pipeline(Arc::new(InMemoryVectorStore::new()));
    pipeline.init().await.unwrap();

    for (query, k) in [("   ", Some(5)), ("fine", Some(0)), ("fine", Some(21))] {
        let err = pipeline.answer(query, k, None).await.unwrap_err();
        assert!(matches!(err, RagError::InvalidArgument(_)), "query={query:?} k={k:?}");
    }
}

#[tokio::test]
async fn empty_document_is_rejected_before_chunking() {
    let pipeline = echo_pipeline(Arc::new(InMemoryVectorStore::new()));
    pipeline.init().await.unwrap();

    let err = pipeline.ingest(&Document::new("empty.txt", "  \n ")).await.unwrap_err();
    assert!(matches!(err, RagError::InvalidArgument(_)));
}

#[tokio::test]
async fn ingest_reports_chunk_count() {
    let pipeline = echo_pipeline(Arc::new(InMemoryVectorStore::new()));
    pipeline.init().await.unwrap();

    // 2500 hard-cut bytes with size 1000 / overlap 200 make exactly 3 chunks.
    let receipt =
        pipeline.ingest(&Document::new("big.txt", "a".repeat(2500))).await.unwrap();
    assert_eq!(receipt.chunks_created, 3);

    let stats = pipeline.stats().await.unwrap();
    assert_eq!(stats.total_documents, 1);
    assert_eq!(stats.total_chunks, 3);
}
