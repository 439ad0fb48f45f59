//! Index trait for pluggable auxiliary search structures

use std::fmt;

use crate::distance::DistanceMetric;
use crate::error::Result;
use crate::record::RecordId;
use crate::vector::Vector;

/// An auxiliary structure the query engine may consult instead of a full
/// scan.
///
/// The store keeps the index in lockstep with its records: `add` is called
/// for every successful insert and `remove` for every removal. The index is
/// part of each snapshot, so it is `Clone`; a write that happens while a
/// snapshot is outstanding clones the index.
///
/// Candidates are re-ranked with exact distances against the snapshot, so an
/// index only has to find the right neighborhood. Ids the snapshot does not
/// hold are ignored.
pub trait Index: Clone + Send + Sync + fmt::Debug {
    /// Add a vector under the given record id. The vector is the one the
    /// store keeps in the record; cloning it shares the coordinates.
    fn add(&mut self, id: RecordId, vector: &Vector) -> Result<()>;

    /// Remove the vector stored under `id`, if any.
    fn remove(&mut self, id: RecordId);

    /// Return up to `k` candidate ids near `query`, or `None` to request an
    /// exact scan.
    fn candidates(&self, query: &[f32], k: usize) -> Result<Option<Vec<RecordId>>>;

    /// The metric the index was built for. The engine consults the index only
    /// for queries under this metric.
    fn metric(&self) -> Option<DistanceMetric>;

    /// The number of live vectors in this index.
    fn len(&self) -> usize;

    /// Whether the index is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The default: no auxiliary index, every query is an exact scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NoIndex;

impl Index for NoIndex {
    fn add(&mut self, _id: RecordId, _vector: &Vector) -> Result<()> {
        Ok(())
    }

    fn remove(&mut self, _id: RecordId) {}

    fn candidates(&self, _query: &[f32], _k: usize) -> Result<Option<Vec<RecordId>>> {
        Ok(None)
    }

    fn metric(&self) -> Option<DistanceMetric> {
        None
    }

    fn len(&self) -> usize {
        0
    }
}
