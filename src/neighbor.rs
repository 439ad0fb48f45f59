//! Priority queues over (distance, id) pairs with a total order.
//!
//! Distances are compared with `f32::total_cmp` and ties are broken by
//! ascending [`RecordId`], so every ranking built from these queues is
//! reproducible.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::record::RecordId;

/// A ranked candidate: a record id and its distance to the query.
#[derive(Debug, Clone, Copy)]
pub struct Neighbor {
    pub distance: f32,
    pub id: RecordId,
}

impl Neighbor {
    pub fn new(id: RecordId, distance: f32) -> Self {
        Self { distance, id }
    }
}

impl PartialEq for Neighbor {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Neighbor {}

impl PartialOrd for Neighbor {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Ascending distance, then ascending id. BinaryHeap<Neighbor> is therefore a
// max-heap with the worst-ranked candidate on top.
impl Ord for Neighbor {
    fn cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Max-heap of neighbors (worst-ranked on top). Used as a result set bounded
/// by `k` or `ef`.
#[derive(Debug, Default)]
pub struct MaxHeap {
    heap: BinaryHeap<Neighbor>,
}

impl MaxHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, n: Neighbor) {
        self.heap.push(n);
    }

    /// Keep only the best `limit` neighbors seen so far.
    pub fn push_bounded(&mut self, n: Neighbor, limit: usize) {
        if limit == 0 {
            return;
        }
        if self.heap.len() < limit {
            self.heap.push(n);
        } else if let Some(worst) = self.heap.peek() {
            if n < *worst {
                self.heap.pop();
                self.heap.push(n);
            }
        }
    }

    pub fn peek(&self) -> Option<&Neighbor> {
        self.heap.peek()
    }

    pub fn pop(&mut self) -> Option<Neighbor> {
        self.heap.pop()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Move every neighbor of `other` into `self`, keeping the best `limit`.
    pub fn merge_bounded(&mut self, other: MaxHeap, limit: usize) {
        for n in other.heap {
            self.push_bounded(n, limit);
        }
    }

    /// Drain into a Vec ranked best-first.
    pub fn into_sorted_vec(self) -> Vec<Neighbor> {
        // BinaryHeap::into_sorted_vec is ascending by Ord, i.e. best first.
        self.heap.into_sorted_vec()
    }
}

/// Min-heap of neighbors (best-ranked on top). Used as the candidate set
/// during graph traversal.
#[derive(Debug, Default)]
pub struct MinHeap {
    heap: BinaryHeap<std::cmp::Reverse<Neighbor>>,
}

impl MinHeap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, n: Neighbor) {
        self.heap.push(std::cmp::Reverse(n));
    }

    pub fn peek(&self) -> Option<&Neighbor> {
        self.heap.peek().map(|r| &r.0)
    }

    pub fn pop(&mut self) -> Option<Neighbor> {
        self.heap.pop().map(|r| r.0)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn n(id: u64, distance: f32) -> Neighbor {
        Neighbor::new(RecordId::new(id), distance)
    }

    #[test]
    fn test_max_heap_ordering() {
        let mut heap = MaxHeap::new();
        heap.push(n(0, 3.0));
        heap.push(n(1, 1.0));
        heap.push(n(2, 2.0));

        assert_eq!(heap.pop().unwrap().distance, 3.0);
        assert_eq!(heap.pop().unwrap().distance, 2.0);
        assert_eq!(heap.pop().unwrap().distance, 1.0);
    }

    #[test]
    fn test_min_heap_ordering() {
        let mut heap = MinHeap::new();
        heap.push(n(0, 3.0));
        heap.push(n(1, 1.0));
        heap.push(n(2, 2.0));

        assert_eq!(heap.pop().unwrap().distance, 1.0);
        assert_eq!(heap.pop().unwrap().distance, 2.0);
        assert_eq!(heap.pop().unwrap().distance, 3.0);
    }

    #[test]
    fn test_bounded_push() {
        let mut heap = MaxHeap::new();
        heap.push_bounded(n(0, 5.0), 2);
        heap.push_bounded(n(1, 1.0), 2);
        heap.push_bounded(n(2, 3.0), 2);

        assert_eq!(heap.len(), 2);
        let sorted = heap.into_sorted_vec();
        assert_eq!(sorted[0].distance, 1.0);
        assert_eq!(sorted[1].distance, 3.0);
    }

    #[test]
    fn test_bounded_push_zero_limit() {
        let mut heap = MaxHeap::new();
        heap.push_bounded(n(0, 1.0), 0);
        assert!(heap.is_empty());
    }

    #[test]
    fn test_ties_break_by_ascending_id() {
        let mut heap = MaxHeap::new();
        for id in [4, 1, 3, 0, 2] {
            heap.push_bounded(n(id, 1.0), 3);
        }
        let ids: Vec<u64> = heap.into_sorted_vec().iter().map(|x| x.id.get()).collect();
        assert_eq!(ids, vec![0, 1, 2]);
    }

    #[test]
    fn test_merge_bounded() {
        let mut a = MaxHeap::new();
        a.push_bounded(n(0, 4.0), 2);
        a.push_bounded(n(1, 2.0), 2);
        let mut b = MaxHeap::new();
        b.push_bounded(n(2, 1.0), 2);
        b.push_bounded(n(3, 3.0), 2);

        a.merge_bounded(b, 2);
        let ids: Vec<u64> = a.into_sorted_vec().iter().map(|x| x.id.get()).collect();
        assert_eq!(ids, vec![2, 1]);
    }

    #[test]
    fn test_into_sorted_vec() {
        let mut heap = MaxHeap::new();
        heap.push(n(0, 5.0));
        heap.push(n(1, 1.0));
        heap.push(n(2, 3.0));
        heap.push(n(3, 2.0));

        let sorted = heap.into_sorted_vec();
        for i in 0..sorted.len() - 1 {
            assert!(sorted[i].distance <= sorted[i + 1].distance);
        }
    }
}
