//! In-memory vector storage with snapshot reads
//!
//! Records live in a dense, append-only slot array in insertion order, which
//! is also ascending [`RecordId`] order. A `RecordId -> slot` map makes point
//! lookup and removal O(1); removal only empties the slot. Once deleted
//! slots exceed the configured fraction of all slots, the array is compacted
//! so scans stay proportional to the live record count.
//!
//! ## Concurrency
//!
//! The whole state sits behind `RwLock<Arc<StoreState>>`. Readers hold the
//! read lock only long enough to clone the `Arc`; queries then run against
//! that [`Snapshot`] without any lock. Writers take the write lock and go
//! through `Arc::make_mut`, which mutates in place when no snapshot is alive
//! and otherwise copies the state so outstanding snapshots are left
//! untouched.
//!
//! That copy is proportional to the live record count but never touches
//! coordinates or metadata: it clones the slot array of `Arc<Record>`
//! pointers, the id map, and the index. `HnswIndex` keeps its nodes behind
//! `Arc` and shares each node's coordinates with the record, so cloning it
//! is a pointer copy per node; the nodes a write then touches are copied
//! one by one. Only the first write after a snapshot pays for the copy.
//! Later writes find the state unshared and run in place until the next
//! snapshot overlaps a write. `benches/search_bench.rs` measures insert
//! latency while searches run.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{RwLock, RwLockWriteGuard};
use tracing::{debug, info};

use crate::config::{QueryConfig, StoreConfig};
use crate::distance::{DistanceMetric, Metric};
use crate::error::Result;
use crate::index::{Index, NoIndex};
use crate::metadata::{Metadata, MetadataPredicate};
use crate::metrics::MetricsCollector;
use crate::query::{QueryEngine, SearchResult};
use crate::record::{Record, RecordId};
use crate::vector::Vector;

#[derive(Debug, Clone)]
struct StoreState<I> {
    slots: Vec<Option<Arc<Record>>>,
    slot_of: HashMap<RecordId, usize>,
    deleted: usize,
    dimension: Option<usize>,
    next_id: RecordId,
    index: I,
}

impl<I: Index> StoreState<I> {
    fn new(index: I, dimension: Option<usize>) -> Self {
        Self {
            slots: Vec::new(),
            slot_of: HashMap::new(),
            deleted: 0,
            dimension,
            next_id: RecordId::new(0),
            index,
        }
    }

    fn get(&self, id: RecordId) -> Option<&Arc<Record>> {
        self.slot_of
            .get(&id)
            .and_then(|&slot| self.slots.get(slot))
            .and_then(Option::as_ref)
    }

    fn needs_compaction(&self, threshold: f64) -> bool {
        self.deleted > 0 && self.deleted as f64 > threshold * self.slots.len() as f64
    }

    /// Drop empty slots, keeping relative order, and rebuild the id map.
    fn compact(&mut self) -> usize {
        let reclaimed = self.deleted;
        self.slots.retain(Option::is_some);
        self.slot_of = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(slot, record)| record.as_ref().map(|r| (r.id(), slot)))
            .collect();
        self.deleted = 0;
        reclaimed
    }
}

/// A consistent point-in-time view of a store.
///
/// Cheap to clone. Inserts and removals that happen after the snapshot was
/// taken are not visible through it.
#[derive(Debug)]
pub struct Snapshot<I = NoIndex> {
    state: Arc<StoreState<I>>,
}

impl<I> Clone for Snapshot<I> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<I: Index> Snapshot<I> {
    /// Number of live records.
    pub fn len(&self) -> usize {
        self.state.slot_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dimension(&self) -> Option<usize> {
        self.state.dimension
    }

    pub fn get(&self, id: RecordId) -> Option<&Arc<Record>> {
        self.state.get(id)
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.state.slot_of.contains_key(&id)
    }

    /// Live records in ascending id order.
    pub fn records(&self) -> impl Iterator<Item = &Arc<Record>> {
        self.state.slots.iter().flatten()
    }

    /// The auxiliary index as of this snapshot.
    pub fn index(&self) -> &I {
        &self.state.index
    }

    /// Raw slot array, including emptied slots awaiting compaction.
    pub(crate) fn slots(&self) -> &[Option<Arc<Record>>] {
        &self.state.slots
    }
}

/// Point-in-time counters describing a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub live: usize,
    pub slots: usize,
    pub deleted: usize,
    pub next_id: RecordId,
    pub dimension: Option<usize>,
    pub inserts: u64,
    pub removes: u64,
    pub queries: u64,
    pub compactions: u64,
}

/// In-memory vector store with a pluggable auxiliary index.
///
/// `VectorStore` is `Send + Sync`; share it between threads with `Arc`.
#[derive(Debug)]
pub struct VectorStore<I: Index = NoIndex> {
    state: RwLock<Arc<StoreState<I>>>,
    config: StoreConfig,
    engine: QueryEngine,
    metrics: MetricsCollector,
}

impl VectorStore<NoIndex> {
    /// Create an empty store that answers every query by exact scan.
    pub fn new() -> Self {
        Self::with_index(NoIndex)
    }

    /// Create an empty store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Result<Self> {
        Self::with_index_and_config(NoIndex, config)
    }
}

impl Default for VectorStore<NoIndex> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Index> VectorStore<I> {
    /// Create an empty store backed by the given auxiliary index.
    ///
    /// The index should be empty; ids it already holds never match a record.
    pub fn with_index(index: I) -> Self {
        let config = StoreConfig::default();
        Self {
            state: RwLock::new(Arc::new(StoreState::new(index, config.dimension))),
            config,
            engine: QueryEngine::default(),
            metrics: MetricsCollector::new(),
        }
    }

    pub fn with_index_and_config(index: I, config: StoreConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            state: RwLock::new(Arc::new(StoreState::new(index, config.dimension))),
            config,
            engine: QueryEngine::default(),
            metrics: MetricsCollector::new(),
        })
    }

    /// Replace the query engine configuration used by the `search*` helpers.
    pub fn with_query_config(mut self, config: QueryConfig) -> Self {
        self.engine = QueryEngine::new(config);
        self
    }

    fn make_mut<'a>(guard: &'a mut RwLockWriteGuard<'_, Arc<StoreState<I>>>) -> &'a mut StoreState<I> {
        if Arc::strong_count(guard) > 1 {
            debug!(
                slots = guard.slots.len(),
                "copying store state for outstanding snapshots"
            );
        }
        Arc::make_mut(guard)
    }

    /// Insert a vector with empty metadata
    pub fn insert_vector(&self, vector: impl Into<Vector>) -> Result<RecordId> {
        self.insert(vector, Metadata::new())
    }

    /// Insert a vector with metadata and return its new id.
    ///
    /// Fails with `InvalidVector` for empty or non-finite vectors and with
    /// `DimensionMismatch` when the length differs from the store's
    /// dimensionality. A failed insert changes nothing, including the id
    /// counter.
    pub fn insert(&self, vector: impl Into<Vector>, metadata: Metadata) -> Result<RecordId> {
        let vector = vector.into();
        vector.validate()?;

        let mut guard = self.state.write();
        if let Some(expected) = guard.dimension {
            vector.check_dimension(expected)?;
        }

        let state = Self::make_mut(&mut guard);
        let id = state.next_id;
        state.index.add(id, &vector)?;

        state.dimension.get_or_insert(vector.dimension());
        state.slot_of.insert(id, state.slots.len());
        state.slots.push(Some(Arc::new(Record::new(id, vector, metadata))));
        state.next_id = id.next();
        drop(guard);

        self.metrics.record_insert();
        debug!(%id, "inserted record");
        Ok(id)
    }

    /// Remove a record. Returns whether a live record was removed; removing an
    /// absent id is a no-op returning `false`.
    pub fn remove(&self, id: RecordId) -> bool {
        let mut guard = self.state.write();
        if !guard.slot_of.contains_key(&id) {
            return false;
        }

        let state = Self::make_mut(&mut guard);
        let Some(slot) = state.slot_of.remove(&id) else {
            return false;
        };
        state.slots[slot] = None;
        state.deleted += 1;
        state.index.remove(id);

        let reclaimed = if state.needs_compaction(self.config.compaction_threshold) {
            Some(state.compact())
        } else {
            None
        };
        let live = state.slot_of.len();
        drop(guard);

        self.metrics.record_remove();
        debug!(%id, "removed record");
        if let Some(reclaimed) = reclaimed {
            self.metrics.record_compaction();
            info!(reclaimed, live, "compacted record slots");
        }
        true
    }

    /// Compact now regardless of the threshold. Returns the number of slots
    /// reclaimed.
    pub fn compact(&self) -> usize {
        let mut guard = self.state.write();
        if guard.deleted == 0 {
            return 0;
        }
        let state = Self::make_mut(&mut guard);
        let reclaimed = state.compact();
        let live = state.slot_of.len();
        drop(guard);

        self.metrics.record_compaction();
        info!(reclaimed, live, "compacted record slots");
        reclaimed
    }

    /// Point lookup.
    pub fn get(&self, id: RecordId) -> Option<Arc<Record>> {
        self.state.read().get(id).cloned()
    }

    pub fn contains(&self, id: RecordId) -> bool {
        self.state.read().slot_of.contains_key(&id)
    }

    /// Get the number of live records in the store
    pub fn len(&self) -> usize {
        self.state.read().slot_of.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get the dimension of vectors in this store (if established)
    pub fn dimension(&self) -> Option<usize> {
        self.state.read().dimension
    }

    /// Take a consistent point-in-time view for querying.
    pub fn snapshot(&self) -> Snapshot<I> {
        Snapshot {
            state: Arc::clone(&self.state.read()),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn stats(&self) -> StoreStats {
        let (live, slots, deleted, next_id, dimension) = {
            let state = self.state.read();
            (
                state.slot_of.len(),
                state.slots.len(),
                state.deleted,
                state.next_id,
                state.dimension,
            )
        };
        StoreStats {
            live,
            slots,
            deleted,
            next_id,
            dimension,
            inserts: self.metrics.total_inserts(),
            removes: self.metrics.total_removes(),
            queries: self.metrics.total_queries(),
            compactions: self.metrics.total_compactions(),
        }
    }

    /// Search for the `top_k` nearest records under Euclidean distance.
    pub fn search(&self, query: &[f32], top_k: usize) -> Result<Vec<SearchResult>> {
        self.search_with(query, top_k, &DistanceMetric::Euclidean, None)
    }

    /// Search for the `top_k` nearest records under any metric, optionally
    /// restricted to records whose metadata passes `filter`.
    pub fn search_with(
        &self,
        query: &[f32],
        top_k: usize,
        metric: &dyn Metric,
        filter: Option<&dyn MetadataPredicate>,
    ) -> Result<Vec<SearchResult>> {
        let start = Instant::now();
        let snapshot = self.snapshot();
        let results = self.engine.search(&snapshot, query, top_k, metric, filter)?;
        self.metrics.record_query(start.elapsed());
        Ok(results)
    }
}
