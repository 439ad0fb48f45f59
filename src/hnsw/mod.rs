//! HNSW (Hierarchical Navigable Small World) auxiliary index.
//!
//! Approximate: the graph may miss true neighbors. The query engine re-ranks
//! the returned candidates with exact distances, so every reported distance
//! is exact and ordering follows the usual `(distance, id)` rule; only
//! membership of the top-k can differ from a brute-force scan. At default
//! parameters average recall@10 against brute force is expected to stay at
//! or above 0.9 (see `tests/recall_test.rs`), including after heavy removal.
//! When the graph yields fewer candidates than the query can be answered
//! with, the engine falls back to an exact scan.

pub mod graph;

pub use graph::{HnswGraph, HnswParams};

use crate::distance::DistanceMetric;
use crate::error::Result;
use crate::index::Index;
use crate::record::RecordId;
use crate::vector::Vector;

/// An HNSW-based approximate nearest neighbor index.
#[derive(Debug, Clone)]
pub struct HnswIndex {
    graph: HnswGraph,
}

impl HnswIndex {
    /// Create a new HNSW index with the given metric and default parameters.
    pub fn new(metric: DistanceMetric) -> Self {
        Self::with_params(metric, HnswParams::default())
    }

    /// Create a new HNSW index with custom parameters.
    pub fn with_params(metric: DistanceMetric, params: HnswParams) -> Self {
        Self {
            graph: HnswGraph::new(metric, params),
        }
    }

    pub fn params(&self) -> &HnswParams {
        self.graph.params()
    }

    /// Search with a specific ef value for runtime tuning. Returns
    /// `(id, approximate-search distance)` pairs best-first.
    pub fn search_with_ef(&self, query: &[f32], k: usize, ef: usize) -> Vec<(RecordId, f32)> {
        self.graph
            .search_knn(query, k, ef)
            .into_iter()
            .map(|n| (n.id, n.distance))
            .collect()
    }
}

impl Index for HnswIndex {
    fn add(&mut self, id: RecordId, vector: &Vector) -> Result<()> {
        self.graph.insert(id, vector.clone());
        Ok(())
    }

    fn remove(&mut self, id: RecordId) {
        self.graph.remove(id);
    }

    fn candidates(&self, query: &[f32], k: usize) -> Result<Option<Vec<RecordId>>> {
        let ef = self.graph.params().ef_search.max(k);
        let ids = self
            .graph
            .search_knn(query, k, ef)
            .into_iter()
            .map(|n| n.id)
            .collect();
        Ok(Some(ids))
    }

    fn metric(&self) -> Option<DistanceMetric> {
        Some(self.graph.metric())
    }

    fn len(&self) -> usize {
        self.graph.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{Metadata, MetadataFilter};
    use crate::storage::VectorStore;

    fn indexed_store() -> VectorStore<HnswIndex> {
        let index = HnswIndex::with_params(
            DistanceMetric::Euclidean,
            HnswParams::new(4, 32, 16).with_seed(11),
        );
        VectorStore::with_index(index)
    }

    #[test]
    fn test_hnsw_index_via_trait() {
        let mut index = HnswIndex::new(DistanceMetric::Euclidean);
        index.add(RecordId::new(0), &Vector::from([1.0, 0.0, 0.0])).unwrap();
        index.add(RecordId::new(1), &Vector::from([0.0, 1.0, 0.0])).unwrap();
        index.add(RecordId::new(2), &Vector::from([1.0, 1.0, 0.0])).unwrap();

        let results = index.search_with_ef(&[1.0, 0.0, 0.0], 2, 16);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].0, RecordId::new(0)); // exact match
        assert!(results[0].1 < 1e-5);
        assert_eq!(index.metric(), Some(DistanceMetric::Euclidean));
    }

    #[test]
    fn test_hnsw_via_vectorstore() {
        let store = indexed_store();
        store.insert_vector([1.0, 0.0, 0.0]).unwrap();
        store.insert_vector([0.0, 1.0, 0.0]).unwrap();
        store.insert_vector([0.0, 0.0, 1.0]).unwrap();
        assert_eq!(store.snapshot().index().len(), 3);

        let results = store.search(&[1.0, 0.1, 0.0], 2).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, RecordId::new(0));
    }

    #[test]
    fn test_hnsw_remove_via_vectorstore() {
        let store = indexed_store();
        let a = store.insert_vector([1.0, 0.0]).unwrap();
        store.insert_vector([0.0, 1.0]).unwrap();
        assert_eq!(store.len(), 2);

        assert!(store.remove(a));
        assert_eq!(store.len(), 1);
        assert_eq!(store.snapshot().index().len(), 1);

        let results = store.search(&[1.0, 0.0], 5).unwrap();
        assert_eq!(results.len(), 1);
        assert_ne!(results[0].id, a);
    }

    #[test]
    fn test_top_k_at_least_len_returns_every_record() {
        let store = indexed_store();
        for i in 0..40 {
            store.insert_vector([i as f32, (i % 3) as f32]).unwrap();
        }
        for i in (0..40).step_by(5) {
            store.remove(RecordId::new(i));
        }
        let len = store.len();
        assert_eq!(len, 32);

        let query = [3.0, 1.0];
        for top_k in [len, len + 1, 1000] {
            let results = store.search(&query, top_k).unwrap();
            let exact = store
                .engine()
                .search_exact(&store.snapshot(), &query, top_k, &DistanceMetric::Euclidean, None)
                .unwrap();
            assert_eq!(results.len(), len);
            assert_eq!(results, exact);
        }
    }

    #[test]
    fn test_index_shrinks_with_removals() {
        let store = indexed_store();
        for i in 0..200 {
            store.insert_vector([i as f32, 0.0]).unwrap();
        }
        for i in 0..190 {
            store.remove(RecordId::new(i));
        }
        let snapshot = store.snapshot();
        assert_eq!(snapshot.index().len(), 10);

        let results = store.search(&[0.0, 0.0], 10).unwrap();
        let ids: Vec<u64> = results.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, (190..200).collect::<Vec<_>>());
    }

    #[test]
    fn test_snapshot_index_unaffected_by_later_removal() {
        let store = indexed_store();
        for i in 0..20 {
            store.insert_vector([i as f32, 0.0]).unwrap();
        }
        let before = store.snapshot();
        store.remove(RecordId::new(3));

        let results = store
            .engine()
            .search(&before, &[3.0, 0.0], 1, &DistanceMetric::Euclidean, None)
            .unwrap();
        assert_eq!(results[0].id, RecordId::new(3));
        assert_eq!(before.index().len(), 20);
        assert_eq!(store.snapshot().index().len(), 19);
    }

    #[test]
    fn test_snapshot_keeps_its_index() {
        let store = indexed_store();
        store.insert_vector([0.0, 0.0]).unwrap();
        let before = store.snapshot();
        store.insert_vector([1.0, 1.0]).unwrap();

        assert_eq!(before.index().len(), 1);
        assert_eq!(store.snapshot().index().len(), 2);
    }

    #[test]
    fn test_filtered_and_other_metric_queries_scan() {
        let store = indexed_store();
        for i in 0..20 {
            let tag = if i == 19 { "rare" } else { "common" };
            store
                .insert([i as f32, 0.0], Metadata::new().with("tag", tag))
                .unwrap();
        }

        let filter = MetadataFilter::new().eq("tag", "rare");
        let results = store
            .search_with(&[0.0, 0.0], 1, &DistanceMetric::Euclidean, Some(&filter))
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, RecordId::new(19));

        let results = store
            .search_with(&[0.0, 0.0], 3, &DistanceMetric::Manhattan, None)
            .unwrap();
        let ids: Vec<u64> = results.iter().map(|r| r.id.get()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }
}
