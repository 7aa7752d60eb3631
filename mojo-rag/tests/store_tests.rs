//! Property tests for document store search.

use mojo_rag::{DocumentStore, Passage, RagError};
use proptest::prelude::*;

const DIM: usize = 16;

/// Generate a non-zero L2-normalized embedding of the given dimension.
fn arb_normalized_embedding(dim: usize) -> impl Strategy<Value = Vec<f32>> {
    proptest::collection::vec(-1.0f32..1.0f32, dim).prop_filter_map(
        "non-zero embedding",
        |mut v| {
            let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm < 1e-3 {
                return None;
            }
            for val in &mut v {
                *val /= norm;
            }
            Some(v)
        },
    )
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Embeddings that are pairwise well separated, so self-retrieval is unambiguous.
fn arb_distinct_embeddings(max: usize) -> impl Strategy<Value = Vec<Vec<f32>>> {
    proptest::collection::vec(arb_normalized_embedding(DIM), 1..max).prop_filter(
        "embeddings must be pairwise distinct",
        |embeddings| {
            embeddings.iter().enumerate().all(|(i, a)| {
                embeddings[i + 1..].iter().all(|b| dot(a, b) < 0.99)
            })
        },
    )
}

fn store_from(embeddings: &[Vec<f32>]) -> DocumentStore {
    let entries = embeddings
        .iter()
        .enumerate()
        .map(|(i, e)| (Passage::new(format!("p{i}"), format!("passage {i}"), "test"), e.clone()))
        .collect();
    DocumentStore::from_embedded(entries).unwrap()
}

/// *For any* store and query, search returns at most `min(k, len)` hits in
/// descending score order.
mod prop_search_ordering {
    use super::*;

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        #[test]
        fn results_ordered_descending_and_bounded(
            embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 1..20),
            query in arb_normalized_embedding(DIM),
            k in 1usize..25,
        ) {
            let store = store_from(&embeddings);
            let result = store.search(&query, k).unwrap();

            prop_assert_eq!(result.len(), k.min(embeddings.len()));
            for window in result.hits().windows(2) {
                prop_assert!(
                    window[0].score >= window[1].score,
                    "results not in descending order: {} < {}",
                    window[0].score,
                    window[1].score,
                );
            }
        }

        #[test]
        fn every_passage_retrieves_itself_first(embeddings in arb_distinct_embeddings(12)) {
            let store = store_from(&embeddings);
            for (i, embedding) in embeddings.iter().enumerate() {
                let result = store.search(embedding, 1).unwrap();
                prop_assert_eq!(result.len(), 1);
                let expected = format!("p{i}");
                prop_assert_eq!(result.top().map(|p| p.id.as_str()), Some(expected.as_str()));
            }
        }

        #[test]
        fn zero_k_is_rejected_for_any_store(
            embeddings in proptest::collection::vec(arb_normalized_embedding(DIM), 1..10),
            query in arb_normalized_embedding(DIM),
        ) {
            let store = store_from(&embeddings);
            let result = store.search(&query, 0);
            let rejected = matches!(result, Err(RagError::InvalidKError { k: 0 }));
            prop_assert!(rejected);
        }
    }
}

#[test]
fn empty_corpus_is_rejected() {
    assert!(matches!(DocumentStore::from_embedded(Vec::new()), Err(RagError::EmptyCorpusError)));
}

#[test]
fn oversized_k_returns_whole_corpus_without_fabrication() {
    let store = store_from(&[vec![1.0, 0.0], vec![0.0, 1.0], vec![0.6, 0.8]]);
    let result = store.search(&[1.0, 0.0], 50).unwrap();
    assert_eq!(result.len(), 3);

    let ids: Vec<&str> = result.passages().map(|p| p.id.as_str()).collect();
    assert_eq!(ids, vec!["p0", "p2", "p1"]);
}

#[test]
fn store_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<DocumentStore>();
}

#[test]
fn non_finite_embeddings_rank_last_without_panicking() {
    let embeddings: Vec<Vec<f32>> = (0..40)
        .map(|i| match i % 3 {
            0 => vec![f32::NAN, 1.0],
            1 => vec![f32::INFINITY, 0.0],
            _ => vec![1.0, 0.0],
        })
        .collect();
    let store = store_from(&embeddings);

    let result = store.search(&[1.0, 0.0], 40).unwrap();
    assert_eq!(result.len(), 40);

    let finite: Vec<&str> = result.passages().take(13).map(|p| p.id.as_str()).collect();
    let expected: Vec<String> = (0..40).filter(|i| i % 3 == 2).map(|i| format!("p{i}")).collect();
    assert_eq!(finite, expected);
    assert!(result.hits()[13..].iter().all(|hit| hit.score == f32::NEG_INFINITY));
}
