//! HNSW graph: core data structures and algorithms.
//!
//! Implements the Hierarchical Navigable Small World graph from:
//! "Efficient and robust approximate nearest neighbor search using
//!  Hierarchical Navigable Small World graphs" (Malkov & Yashunin, 2016/2018).
//!
//! Nodes are keyed by record id in a `BTreeMap` and held behind `Arc`, so
//! cloning the graph copies pointers and a later write copies only the nodes
//! it touches. Node vectors share their coordinates with the stored records.
//!
//! Removal is a soft delete: the node stays as a waypoint that searches walk
//! through but never return. Once tombstones outnumber live nodes the graph is
//! rebuilt from the live nodes, so its size stays proportional to the live
//! count.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::distance::DistanceMetric;
use crate::neighbor::{MaxHeap, MinHeap, Neighbor};
use crate::record::RecordId;
use crate::vector::Vector;

/// Configuration parameters for the HNSW index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HnswParams {
    /// Max number of connections per node (layers > 0).
    pub m: usize,
    /// Max connections at layer 0 (typically 2 * m).
    pub m_max0: usize,
    /// Number of candidates during construction.
    pub ef_construction: usize,
    /// Number of candidates during search.
    pub ef_search: usize,
    /// Level generation factor: 1 / ln(m).
    pub ml: f64,
    /// Maximum number of layers.
    pub max_layers: usize,
    /// Seed for level generation. `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Default for HnswParams {
    fn default() -> Self {
        Self::new(16, 200, 50)
    }
}

impl HnswParams {
    /// `m` is raised to at least 2 so the level factor stays finite.
    pub fn new(m: usize, ef_construction: usize, ef_search: usize) -> Self {
        let m = m.max(2);
        Self {
            m,
            m_max0: 2 * m,
            ef_construction,
            ef_search,
            ml: 1.0 / (m as f64).ln(),
            max_layers: 16,
            seed: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

/// A node in the HNSW graph.
#[derive(Debug, Clone)]
struct HnswNode {
    vector: Vector,
    /// Neighbors per layer. neighbors[l] is the list of neighbor ids at layer l.
    neighbors: Vec<Vec<RecordId>>,
    /// The maximum layer this node was inserted into.
    level: usize,
    /// Tombstone: still traversed, never returned.
    deleted: bool,
}

/// The HNSW graph structure.
#[derive(Debug, Clone)]
pub struct HnswGraph {
    nodes: BTreeMap<RecordId, Arc<HnswNode>>,
    /// Entry point node (highest-level node). May be a tombstone.
    entry_point: Option<RecordId>,
    /// Current maximum level in the graph.
    max_level: usize,
    params: HnswParams,
    metric: DistanceMetric,
    /// RNG for level generation.
    rng: StdRng,
    live: usize,
    tombstones: usize,
}

impl HnswGraph {
    pub fn new(metric: DistanceMetric, params: HnswParams) -> Self {
        let rng = match params.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            nodes: BTreeMap::new(),
            entry_point: None,
            max_level: 0,
            params,
            metric,
            rng,
            live: 0,
            tombstones: 0,
        }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn params(&self) -> &HnswParams {
        &self.params
    }

    /// Number of live (not removed) nodes.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    fn node(&self, id: RecordId) -> Option<&HnswNode> {
        self.nodes.get(&id).map(Arc::as_ref)
    }

    fn node_mut(&mut self, id: RecordId) -> Option<&mut HnswNode> {
        self.nodes.get_mut(&id).map(Arc::make_mut)
    }

    fn is_live(&self, id: RecordId) -> bool {
        self.node(id).is_some_and(|n| !n.deleted)
    }

    /// Generate a random level for a new node.
    fn random_level(&mut self) -> usize {
        let r: f64 = self.rng.gen();
        let level = (-r.ln() * self.params.ml).floor() as usize;
        level.min(self.params.max_layers.saturating_sub(1))
    }

    /// Distance between a query vector and a node; unknown ids are infinitely far.
    fn distance(&self, query: &[f32], id: RecordId) -> f32 {
        self.node(id)
            .map(|n| self.metric.distance(query, n.vector.as_slice()))
            .unwrap_or(f32::INFINITY)
    }

    /// Greedy walk on one layer (SEARCH-LAYER with ef = 1), moving through
    /// tombstones as well as live nodes.
    fn greedy_closest(&self, query: &[f32], from: RecordId, layer: usize) -> RecordId {
        let mut best = Neighbor::new(from, self.distance(query, from));
        loop {
            let mut next = best;
            if let Some(list) = self.node(best.id).and_then(|n| n.neighbors.get(layer)) {
                for &id in list {
                    let candidate = Neighbor::new(id, self.distance(query, id));
                    if candidate < next {
                        next = candidate;
                    }
                }
            }
            if next.id == best.id {
                return best.id;
            }
            best = next;
        }
    }

    /// SEARCH-LAYER: Algorithm 2 from the HNSW paper.
    ///
    /// Search a single layer for the ef closest live nodes to query, starting
    /// from `ep`. Tombstones are expanded like any other node but never
    /// enter the result set. Returned best-first.
    fn search_layer(&self, query: &[f32], ep: RecordId, ef: usize, layer: usize) -> Vec<Neighbor> {
        let ef = ef.max(1);
        let mut visited = HashSet::new();
        let mut candidates = MinHeap::new(); // closest candidate on top
        let mut results = MaxHeap::new(); // furthest live result on top

        let start = Neighbor::new(ep, self.distance(query, ep));
        visited.insert(ep);
        candidates.push(start);
        if self.is_live(ep) {
            results.push(start);
        }

        while let Some(c) = candidates.pop() {
            // Once the result set is full, stop at the first candidate that
            // is further than the furthest result
            if results.len() >= ef {
                let furthest = results.peek().map(|n| n.distance).unwrap_or(f32::INFINITY);
                if c.distance > furthest {
                    break;
                }
            }

            let Some(layer_neighbors) = self.node(c.id).and_then(|n| n.neighbors.get(layer))
            else {
                continue;
            };

            for &id in layer_neighbors {
                if !visited.insert(id) {
                    continue;
                }
                let Some(node) = self.node(id) else {
                    continue;
                };

                let dist = self.metric.distance(query, node.vector.as_slice());
                let furthest = results.peek().map(|n| n.distance).unwrap_or(f32::INFINITY);

                if results.len() < ef || dist < furthest {
                    let neighbor = Neighbor::new(id, dist);
                    candidates.push(neighbor);
                    if !node.deleted {
                        results.push(neighbor);
                        if results.len() > ef {
                            results.pop(); // remove furthest
                        }
                    }
                }
            }
        }

        results.into_sorted_vec()
    }

    /// Prune a node's neighbor list at a given layer to `m` entries, keeping
    /// the closest live neighbors and filling any remaining room with the
    /// closest tombstones.
    fn prune_neighbors(&mut self, id: RecordId, layer: usize, m: usize) {
        let Some(node) = self.node(id) else {
            return;
        };
        let Some(current) = node.neighbors.get(layer) else {
            return;
        };

        let mut live = MaxHeap::with_capacity(m);
        let mut dead = MaxHeap::new();
        for &neighbor in current {
            let Some(other) = self.node(neighbor) else {
                continue;
            };
            let dist = self
                .metric
                .distance(node.vector.as_slice(), other.vector.as_slice());
            if other.deleted {
                dead.push_bounded(Neighbor::new(neighbor, dist), m);
            } else {
                live.push_bounded(Neighbor::new(neighbor, dist), m);
            }
        }

        let mut kept: Vec<RecordId> = live.into_sorted_vec().iter().map(|n| n.id).collect();
        let room = m.saturating_sub(kept.len());
        kept.extend(dead.into_sorted_vec().iter().take(room).map(|n| n.id));

        if let Some(node) = self.node_mut(id) {
            node.neighbors[layer] = kept;
        }
    }

    /// INSERT: Algorithm 1 from the HNSW paper. Re-inserting an id already in
    /// the graph replaces its node.
    pub fn insert(&mut self, id: RecordId, vector: Vector) {
        if self.nodes.contains_key(&id) {
            self.unlink(id);
        }
        let level = self.random_level();
        let coords = vector.clone();
        let query = coords.as_slice();

        self.nodes.insert(
            id,
            Arc::new(HnswNode {
                vector,
                neighbors: vec![Vec::new(); level + 1],
                level,
                deleted: false,
            }),
        );
        self.live += 1;

        // First node becomes the entry point
        let Some(mut ep) = self.entry_point else {
            self.entry_point = Some(id);
            self.max_level = level;
            return;
        };
        let current_max_level = self.max_level;

        // Phase 1: Greedy descent from top layer down to level+1
        for l in (level + 1..=current_max_level).rev() {
            ep = self.greedy_closest(query, ep, l);
        }

        // Phase 2: Connect at layers min(level, current_max_level) down to 0
        for l in (0..=level.min(current_max_level)).rev() {
            let m = if l == 0 {
                self.params.m_max0
            } else {
                self.params.m
            };

            let nearest = self.search_layer(query, ep, self.params.ef_construction, l);
            let mut selected: Vec<RecordId> = nearest
                .iter()
                .map(|n| n.id)
                .filter(|&n| n != id)
                .take(m)
                .collect();
            // No live node reachable: hang off the waypoint so the new node
            // is never isolated
            if selected.is_empty() && ep != id {
                selected.push(ep);
            }

            if let Some(node) = self.node_mut(id) {
                node.neighbors[l] = selected.clone();
            }

            // Bidirectional connections, pruning neighbors that overflow
            for &neighbor in &selected {
                let needs_pruning = match self.node_mut(neighbor) {
                    Some(other) if l < other.neighbors.len() => {
                        other.neighbors[l].push(id);
                        other.neighbors[l].len() > m
                    }
                    _ => false,
                };
                if needs_pruning {
                    self.prune_neighbors(neighbor, l, m);
                }
            }

            if let Some(n) = nearest.iter().find(|n| n.id != id) {
                ep = n.id;
            }
        }

        // Update entry point if new node has a higher level
        if level > self.max_level {
            self.entry_point = Some(id);
            self.max_level = level;
        }
    }

    /// Soft-delete a node. Removing an unknown or already removed id is a
    /// no-op.
    pub fn remove(&mut self, id: RecordId) {
        let Some(node) = self.node_mut(id) else {
            return;
        };
        if node.deleted {
            return;
        }
        node.deleted = true;
        self.live -= 1;
        self.tombstones += 1;

        if self.live == 0 {
            self.clear();
        } else if self.tombstones > self.live {
            self.rebuild();
        }
    }

    /// Drop a node outright, unlinking it from the neighbor lists it appears in.
    fn unlink(&mut self, id: RecordId) {
        let Some(node) = self.nodes.remove(&id) else {
            return;
        };
        for (layer, neighbors) in node.neighbors.iter().enumerate() {
            for &neighbor in neighbors {
                if let Some(list) = self
                    .node_mut(neighbor)
                    .and_then(|other| other.neighbors.get_mut(layer))
                {
                    list.retain(|&n| n != id);
                }
            }
        }
        if node.deleted {
            self.tombstones -= 1;
        } else {
            self.live -= 1;
        }

        if self.entry_point == Some(id) {
            let replacement = self
                .nodes
                .iter()
                .map(|(&nid, n)| (nid, n.level))
                .max_by_key(|&(nid, level)| (level, Reverse(nid)));
            self.entry_point = replacement.map(|(nid, _)| nid);
            self.max_level = replacement.map(|(_, level)| level).unwrap_or(0);
        }
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.entry_point = None;
        self.max_level = 0;
        self.live = 0;
        self.tombstones = 0;
    }

    /// Rebuild the graph from its live nodes, discarding every tombstone.
    fn rebuild(&mut self) {
        let survivors: Vec<(RecordId, Vector)> = self
            .nodes
            .iter()
            .filter(|(_, n)| !n.deleted)
            .map(|(&id, n)| (id, n.vector.clone()))
            .collect();
        let reclaimed = self.tombstones;

        self.clear();
        for (id, vector) in survivors {
            self.insert(id, vector);
        }
        debug!(live = self.live, reclaimed, "rebuilt hnsw graph");
    }

    /// SEARCH: Algorithm 5 from the HNSW paper.
    ///
    /// Search for the k nearest live neighbors, using ef candidates.
    pub fn search_knn(&self, query: &[f32], k: usize, ef: usize) -> Vec<Neighbor> {
        let Some(mut ep) = self.entry_point else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }

        // Phase 1: Greedy descent from top layer to layer 1
        for l in (1..=self.max_level).rev() {
            ep = self.greedy_closest(query, ep, l);
        }

        // Phase 2: Search layer 0 with max(ef, k) candidates
        let mut results = self.search_layer(query, ep, ef.max(k), 0);
        results.truncate(k);
        results
    }
}
