//! Property tests for in-memory vector store search ordering.

use std::collections::HashMap;

use proptest::prelude::*;
use ragline::document::Chunk;
use ragline::inmemory::InMemoryVectorStore;
use ragline::vectorstore::VectorStore;

const DIM: usize = 16;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-8 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

/// Generate a chunk with a normalized embedding.
fn arb_chunk(dim: usize) -> impl Strategy<Value = Chunk> {
    ("[a-z]{3,8}", "[a-z ]{5,30}", arb_normalized_embedding(dim)).prop_map(
        |(id, text, embedding)| Chunk {
            id,
            text,
            position: 0,
            embedding,
            metadata: HashMap::new(),
            document_id: "doc_1".to_string(),
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// For any stored chunk set, search results are ordered by descending
    /// cosine similarity, bounded by `top_k`, and every returned score is
    /// at least `min_score`.
    #[test]
    fn search_is_ordered_bounded_and_thresholded(
        chunks in proptest::collection::vec(arb_chunk(DIM), 1..20),
        query in arb_normalized_embedding(DIM),
        top_k in 1usize..25,
        min_score in -1.0f32..1.0f32,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (results, stored) = rt.block_on(async {
            let store = InMemoryVectorStore::new(DIM);
            let stored = store.upsert(&chunks).await.unwrap();
            let results = store.search(&query, top_k, min_score).await.unwrap();
            (results, stored)
        });

        prop_assert_eq!(stored, chunks.len());
        prop_assert!(results.len() <= top_k);
        prop_assert!(results.len() <= stored);

        for result in &results {
            prop_assert!(
                result.score >= min_score,
                "score {} below threshold {}",
                result.score,
                min_score,
            );
        }

        for window in results.windows(2) {
            prop_assert!(
                window[0].score >= window[1].score,
                "results not in descending order: {} < {}",
                window[0].score,
                window[1].score,
            );
        }
    }

    /// With the threshold at the minimum, search returns every stored
    /// record up to `top_k`; raising the threshold never increases the
    /// result count.
    #[test]
    fn raising_threshold_is_monotone(
        chunks in proptest::collection::vec(arb_chunk(DIM), 1..15),
        query in arb_normalized_embedding(DIM),
        threshold in 0.0f32..1.0f32,
    ) {
        let rt = tokio::runtime::Runtime::new().unwrap();
        let (all, filtered) = rt.block_on(async {
            let store = InMemoryVectorStore::new(DIM);
            store.upsert(&chunks).await.unwrap();
            let all = store.search(&query, chunks.len(), -2.0).await.unwrap();
            let filtered = store.search(&query, chunks.len(), threshold).await.unwrap();
            (all, filtered)
        });

        prop_assert_eq!(all.len(), chunks.len());
        prop_assert!(filtered.len() <= all.len());
    }
}
