//! Property tests for store invariants

use proptest::prelude::*;
use std::collections::BTreeSet;
use vecstore::{DistanceMetric, Metadata, RecordId, VectorStore, VectorStoreError};

#[derive(Debug, Clone)]
enum Op {
    Insert(Vec<f32>),
    Remove(u64),
}

fn op_strategy(dim: usize) -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => prop::collection::vec(-100.0f32..100.0, dim).prop_map(Op::Insert),
        1 => (0u64..64).prop_map(Op::Remove),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn size_tracks_inserts_minus_removes(ops in prop::collection::vec(op_strategy(3), 0..120)) {
        let store = VectorStore::new();
        let mut live = BTreeSet::new();
        let mut next = 0u64;

        for op in ops {
            match op {
                Op::Insert(v) => {
                    let id = store.insert(v, Metadata::new()).unwrap();
                    prop_assert_eq!(id, RecordId::new(next));
                    live.insert(next);
                    next += 1;
                }
                Op::Remove(id) => {
                    let removed = store.remove(RecordId::new(id));
                    prop_assert_eq!(removed, live.remove(&id));
                }
            }
            prop_assert_eq!(store.len(), live.len());
        }

        let seen: BTreeSet<u64> = store.snapshot().records().map(|r| r.id().get()).collect();
        prop_assert_eq!(seen, live);
    }

    #[test]
    fn mismatched_dimension_never_changes_size(
        first in prop::collection::vec(-10.0f32..10.0, 1..8),
        other_len in 1usize..8,
    ) {
        prop_assume!(other_len != first.len());
        let store = VectorStore::new();
        store.insert_vector(first.clone()).unwrap();

        let result = store.insert_vector(vec![0.0; other_len]);
        let is_mismatch = matches!(result, Err(VectorStoreError::DimensionMismatch { .. }));
        prop_assert!(is_mismatch);
        prop_assert_eq!(store.len(), 1);
        prop_assert_eq!(store.stats().next_id, RecordId::new(1));
    }

    #[test]
    fn results_are_sorted_distinct_and_clamped(
        vectors in prop::collection::vec(prop::collection::vec(-5.0f32..5.0, 4), 1..40),
        query in prop::collection::vec(-5.0f32..5.0, 4),
        top_k in 1usize..60,
    ) {
        let store = VectorStore::new();
        for v in &vectors {
            store.insert_vector(v.clone()).unwrap();
        }

        for metric in [DistanceMetric::Euclidean, DistanceMetric::Cosine] {
            let results = store.search_with(&query, top_k, &metric, None).unwrap();
            prop_assert_eq!(results.len(), top_k.min(vectors.len()));

            let distinct: BTreeSet<RecordId> = results.iter().map(|r| r.id).collect();
            prop_assert_eq!(distinct.len(), results.len());
            for w in results.windows(2) {
                prop_assert!((w[0].distance, w[0].id) <= (w[1].distance, w[1].id));
            }
        }
    }
}
