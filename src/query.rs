//! Query engine: ranks snapshot records against a query vector.
//!
//! The engine is stateless apart from its tuning knobs and never mutates the
//! store. Ranking is by ascending distance with ties broken by ascending
//! [`RecordId`]; distances are ordered with `f32::total_cmp`, so identical
//! queries against identical snapshots always produce identical results.

use std::collections::HashSet;
use std::sync::Arc;

use rayon::prelude::*;
use serde::Serialize;
use tracing::trace;

use crate::config::QueryConfig;
use crate::distance::Metric;
use crate::error::{Result, VectorStoreError};
use crate::index::Index;
use crate::metadata::{Metadata, MetadataPredicate};
use crate::neighbor::{MaxHeap, Neighbor};
use crate::record::{Record, RecordId};
use crate::storage::Snapshot;

/// A ranked search hit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResult {
    pub id: RecordId,
    pub metadata: Metadata,
    pub distance: f32,
}

/// Stateless ranking layer over a [`Snapshot`].
#[derive(Debug, Clone, Default)]
pub struct QueryEngine {
    config: QueryConfig,
}

impl QueryEngine {
    pub fn new(config: QueryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    /// Return up to `top_k` records nearest to `query`, best first.
    ///
    /// Records failing `filter` are excluded before ranking, so `top_k`
    /// counts only eligible records. When the snapshot carries an auxiliary
    /// index built for `metric` and no filter is given, the index supplies
    /// the candidates and the result may be approximate; otherwise every live
    /// record is scanned. An index answer with fewer than
    /// `min(top_k, snapshot.len())` live candidates is replaced by a scan, so
    /// the result length never depends on the index.
    ///
    /// An empty snapshot yields an empty result. `top_k == 0` is
    /// `InvalidArgument`; a query of the wrong length is `DimensionMismatch`.
    pub fn search<I: Index>(
        &self,
        snapshot: &Snapshot<I>,
        query: &[f32],
        top_k: usize,
        metric: &dyn Metric,
        filter: Option<&dyn MetadataPredicate>,
    ) -> Result<Vec<SearchResult>> {
        if !Self::validate(snapshot, query, top_k)? {
            return Ok(Vec::new());
        }

        let index = snapshot.index();
        let use_index = filter.is_none()
            && !index.is_empty()
            && metric.kind().is_some()
            && metric.kind() == index.metric();

        if use_index {
            let wanted = top_k.max(self.config.index_candidates);
            if let Some(candidates) = index.candidates(query, wanted)? {
                let heap = Self::rank_candidates(snapshot, &candidates, query, top_k, metric);
                if heap.len() >= top_k.min(snapshot.len()) {
                    trace!(candidates = candidates.len(), top_k, "ranked index candidates");
                    return Ok(Self::collect(snapshot, heap));
                }
                trace!(
                    found = heap.len(),
                    top_k,
                    "index returned too few live candidates, scanning"
                );
            }
        }

        trace!(live = snapshot.len(), top_k, "exact scan");
        let heap = self.scan(snapshot, query, top_k, metric, filter);
        Ok(Self::collect(snapshot, heap))
    }

    /// Like [`search`](Self::search) but always scans every live record,
    /// ignoring any auxiliary index.
    pub fn search_exact<I: Index>(
        &self,
        snapshot: &Snapshot<I>,
        query: &[f32],
        top_k: usize,
        metric: &dyn Metric,
        filter: Option<&dyn MetadataPredicate>,
    ) -> Result<Vec<SearchResult>> {
        if !Self::validate(snapshot, query, top_k)? {
            return Ok(Vec::new());
        }
        let heap = self.scan(snapshot, query, top_k, metric, filter);
        Ok(Self::collect(snapshot, heap))
    }

    /// Check arguments. `Ok(false)` means the snapshot is empty and the
    /// result is trivially empty.
    fn validate<I: Index>(snapshot: &Snapshot<I>, query: &[f32], top_k: usize) -> Result<bool> {
        if top_k == 0 {
            return Err(VectorStoreError::invalid_argument(
                "top_k must be a positive integer",
            ));
        }
        if snapshot.is_empty() {
            return Ok(false);
        }
        if let Some(expected) = snapshot.dimension() {
            if query.len() != expected {
                return Err(VectorStoreError::DimensionMismatch {
                    expected,
                    actual: query.len(),
                });
            }
        }
        if let Some(pos) = query.iter().position(|x| !x.is_finite()) {
            return Err(VectorStoreError::invalid_vector(format!(
                "query has non-finite coordinate at position {}",
                pos
            )));
        }
        Ok(true)
    }

    fn scan<I: Index>(
        &self,
        snapshot: &Snapshot<I>,
        query: &[f32],
        top_k: usize,
        metric: &dyn Metric,
        filter: Option<&dyn MetadataPredicate>,
    ) -> MaxHeap {
        let slots = snapshot.slots();
        if slots.len() < self.config.parallel_threshold.max(1) {
            return Self::scan_slots(slots, query, top_k, metric, filter);
        }

        let chunk = (slots.len() / rayon::current_num_threads().max(1)).max(1024);
        slots
            .par_chunks(chunk)
            .map(|part| Self::scan_slots(part, query, top_k, metric, filter))
            .reduce(MaxHeap::new, |mut acc, part| {
                acc.merge_bounded(part, top_k);
                acc
            })
    }

    fn scan_slots(
        slots: &[Option<Arc<Record>>],
        query: &[f32],
        top_k: usize,
        metric: &dyn Metric,
        filter: Option<&dyn MetadataPredicate>,
    ) -> MaxHeap {
        let mut heap = MaxHeap::with_capacity(top_k.min(slots.len()));
        for record in slots.iter().flatten() {
            if let Some(filter) = filter {
                if !filter.matches(record.metadata()) {
                    continue;
                }
            }
            let distance = metric.distance(query, record.vector().as_slice());
            heap.push_bounded(Neighbor::new(record.id(), distance), top_k);
        }
        heap
    }

    fn rank_candidates<I: Index>(
        snapshot: &Snapshot<I>,
        candidates: &[RecordId],
        query: &[f32],
        top_k: usize,
        metric: &dyn Metric,
    ) -> MaxHeap {
        let mut seen = HashSet::with_capacity(candidates.len());
        let mut heap = MaxHeap::with_capacity(top_k.min(candidates.len()));
        for &id in candidates {
            if !seen.insert(id) {
                continue;
            }
            if let Some(record) = snapshot.get(id) {
                let distance = metric.distance(query, record.vector().as_slice());
                heap.push_bounded(Neighbor::new(id, distance), top_k);
            }
        }
        heap
    }

    fn collect<I: Index>(snapshot: &Snapshot<I>, heap: MaxHeap) -> Vec<SearchResult> {
        heap.into_sorted_vec()
            .into_iter()
            .filter_map(|n| {
                snapshot.get(n.id).map(|record| SearchResult {
                    id: n.id,
                    metadata: record.metadata().clone(),
                    distance: n.distance,
                })
            })
            .collect()
    }
}
