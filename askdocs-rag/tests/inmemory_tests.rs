//! In-memory vector store behavior: search ordering, filter scoping, and the
//! empty-is-not-an-error contract.

use std::collections::HashMap;

use askdocs_rag::document::Chunk;
use askdocs_rag::inmemory::InMemoryVectorStore;
use askdocs_rag::vectorstore::{SearchFilter, VectorStore};
use proptest::prelude::*;
use uuid::Uuid;

fn chunk(document_id: Uuid, sequence_index: usize, embedding: Vec<f32>) -> Chunk {
    Chunk {
        id: Uuid::new_v4(),
        document_id,
        filename: format!("{document_id}.txt"),
        sequence_index,
        text: format!("chunk {sequence_index} of {document_id}"),
        embedding,
        metadata: HashMap::new(),
    }
}

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map("non-zero embedding", |mut v| {
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm < 1e-8 {
            return None;
        }
        for val in &mut v {
            *val /= norm;
        }
        Some(v)
    })
}

mod prop_search_ordering {
    use super::*;

    const DIM: usize = 16;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Results come back ordered by descending cosine similarity, at most
        /// `k` of them.
        #[test]
        fn results_ordered_descending_and_bounded_by_k(
            embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            k in 1usize..25,
        ) {
            let rt = tokio::runtime::Runtime::new().unwrap();
            let (results, stored) = rt.block_on(async {
                let store = InMemoryVectorStore::new();
                store.create_collection("test", DIM).await.unwrap();

                let doc = Uuid::new_v4();
                let chunks: Vec<Chunk> = embeddings
                    .into_iter()
                    .enumerate()
                    .map(|(i, e)| chunk(doc, i, e))
                    .collect();
                let stored = chunks.len();

                store.upsert("test", &chunks).await.unwrap();
                (store.search("test", &query, k, None).await.unwrap(), stored)
            });

            prop_assert!(results.len() <= k);
            prop_assert!(results.len() <= stored);
            for window in results.windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }
    }
}

#[tokio::test]
async fn empty_store_returns_empty_not_error() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", 4).await.unwrap();
    let results = store.search("docs", &[1.0, 0.0, 0.0, 0.0], 5, None).await.unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn filtered_search_only_returns_the_scoped_document() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", 2).await.unwrap();

    let doc_a = Uuid::new_v4();
    let doc_b = Uuid::new_v4();
    store
        .upsert(
            "docs",
            &[
                chunk(doc_a, 0, vec![1.0, 0.0]),
                chunk(doc_a, 1, vec![0.9, 0.1]),
                chunk(doc_b, 0, vec![1.0, 0.0]),
            ],
        )
        .await
        .unwrap();

    let results = store
        .search("docs", &[1.0, 0.0], 10, Some(SearchFilter { document_id: doc_a }))
        .await
        .unwrap();

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.chunk.document_id == doc_a));
}

#[tokio::test]
async fn filter_matching_nothing_is_empty_not_error() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", 2).await.unwrap();
    store.upsert("docs", &[chunk(Uuid::new_v4(), 0, vec![1.0, 0.0])]).await.unwrap();

    let results = store
        .search("docs", &[1.0, 0.0], 10, Some(SearchFilter { document_id: Uuid::new_v4() }))
        .await
        .unwrap();
    assert!(results.is_empty());
}

#[tokio::test]
async fn stats_count_documents_and_chunks() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", 2).await.unwrap();

    let doc_a = Uuid::new_v4();
    let doc_b = Uuid::new_v4();
    store
        .upsert(
            "docs",
            &[
                chunk(doc_a, 0, vec![1.0, 0.0]),
                chunk(doc_a, 1, vec![0.0, 1.0]),
                chunk(doc_b, 0, vec![1.0, 0.0]),
            ],
        )
        .await
        .unwrap();

    let stats = store.stats("docs").await.unwrap();
    assert_eq!(stats.total_documents, 2);
    assert_eq!(stats.total_chunks, 3);
}

#[tokio::test]
async fn contains_document_asserts_presence_and_absence() {
    let store = InMemoryVectorStore::new();
    store.create_collection("docs", 2).await.unwrap();

    let doc = Uuid::new_v4();
    store.upsert("docs", &[chunk(doc, 0, vec![1.0, 0.0])]).await.unwrap();

    assert_eq!(store.contains_document("docs", doc).await.unwrap(), Some(true));
    assert_eq!(store.contains_document("docs", Uuid::new_v4()).await.unwrap(), Some(false));
}
