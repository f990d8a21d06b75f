//! In-memory HNSW index.
//!
//! `MemoryHnsw` holds the whole graph in RAM: one adjacency table per layer,
//! vectors in a flat arena, external ids mapped both ways. It serves two
//! roles: a standalone index for datasets that fit in memory, and the origin
//! the [bulk importer](super::import) streams into a persistent graph. It
//! runs the same deterministic level assignment and the same neighbor
//! diversification as the graph-backed index, so importing preserves search
//! behavior.

use crate::distance::{DistanceComparator, DistanceMetric};
use crate::error::{Error, Result};
use crate::index::hnsw::heuristic::select_diverse;
use crate::index::hnsw::level::LevelAssigner;
use crate::index::hnsw::ordered::OrderedFloat;
use crate::index::hnsw::params::HnswParams;
use parking_lot::RwLock;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Node identity inside an in-memory index: a dense index into the arenas.
pub type NodeId = usize;

/// A single layer: adjacency lists indexed by node.
struct MemoryLayer {
    neighbors: Vec<RwLock<Vec<NodeId>>>,
}

impl MemoryLayer {
    fn new(capacity: usize) -> Self {
        Self {
            neighbors: (0..capacity).map(|_| RwLock::new(Vec::new())).collect(),
        }
    }

    fn ensure_capacity(&mut self, node: NodeId) {
        while self.neighbors.len() <= node {
            self.neighbors.push(RwLock::new(Vec::new()));
        }
    }

    fn neighbors_of(&self, node: NodeId) -> Vec<NodeId> {
        if node < self.neighbors.len() {
            self.neighbors[node].read().clone()
        } else {
            Vec::new()
        }
    }

    fn set_neighbors(&self, node: NodeId, neighbors: Vec<NodeId>) {
        *self.neighbors[node].write() = neighbors;
    }

    fn push_neighbor(&self, node: NodeId, neighbor: NodeId) {
        self.neighbors[node].write().push(neighbor);
    }
}

/// One node of a snapshot, as handed to the bulk importer.
#[derive(Debug, Clone)]
pub struct SnapshotNode {
    /// Dense node id inside the origin.
    pub node: NodeId,
    /// External id the node was inserted under.
    pub external_id: String,
    /// The vector.
    pub vector: Vec<f32>,
    /// Top layer of the node.
    pub max_level: usize,
    /// Out-neighbors per layer, `connections[l]` for layer `l`,
    /// `0 <= l <= max_level`. No duplicates within a list.
    pub connections: Vec<Vec<NodeId>>,
}

/// Serialized form of a whole in-memory index.
#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    metric: DistanceMetric,
    comparator: DistanceComparator,
    params: SnapshotParams,
    entry_point: Option<NodeId>,
    max_layer: usize,
    external_ids: Vec<String>,
    vectors: Vec<Vec<f32>>,
    levels: Vec<usize>,
    connections: Vec<Vec<Vec<NodeId>>>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotParams {
    dimensions: usize,
    max_item_count: usize,
    m: usize,
    ef: usize,
    ef_construction: usize,
}

/// In-memory HNSW index.
///
/// Searches may run concurrently with each other; building is a
/// single-threaded operation. The concurrency protocol for parallel inserts
/// lives in the graph-backed [`HnswIndex`](super::HnswIndex) only.
pub struct MemoryHnsw {
    metric: DistanceMetric,
    comparator: DistanceComparator,
    params: HnswParams,
    assigner: LevelAssigner,
    vectors: RwLock<Vec<Vec<f32>>>,
    external_ids: RwLock<Vec<String>>,
    by_external: RwLock<FxHashMap<String, NodeId>>,
    levels: RwLock<Vec<usize>>,
    layers: RwLock<Vec<MemoryLayer>>,
    entry_point: RwLock<Option<NodeId>>,
    max_layer: AtomicUsize,
}

impl MemoryHnsw {
    /// Creates an empty in-memory index with the metric's default comparator.
    #[must_use]
    pub fn new(metric: DistanceMetric, params: HnswParams) -> Self {
        Self::with_comparator(metric, metric.default_comparator(), params)
    }

    /// Creates an empty in-memory index with an explicit comparator.
    #[must_use]
    pub fn with_comparator(
        metric: DistanceMetric,
        comparator: DistanceComparator,
        params: HnswParams,
    ) -> Self {
        let assigner = LevelAssigner::new(params.level_lambda);
        Self {
            metric,
            comparator,
            params,
            assigner,
            vectors: RwLock::new(Vec::new()),
            external_ids: RwLock::new(Vec::new()),
            by_external: RwLock::new(FxHashMap::default()),
            levels: RwLock::new(Vec::new()),
            layers: RwLock::new(vec![MemoryLayer::new(0)]),
            entry_point: RwLock::new(None),
            max_layer: AtomicUsize::new(0),
        }
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vectors.read().len()
    }

    /// Returns true if the index is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the entry-point node, if any.
    #[must_use]
    pub fn entry_point(&self) -> Option<NodeId> {
        *self.entry_point.read()
    }

    /// Returns the highest layer present in the index.
    #[must_use]
    pub fn max_layer(&self) -> usize {
        self.max_layer.load(Ordering::Acquire)
    }

    /// Returns the top layer of a node.
    #[must_use]
    pub fn node_level(&self, node: NodeId) -> usize {
        self.levels.read().get(node).copied().unwrap_or(0)
    }

    /// Resolves an external id to its node.
    #[must_use]
    pub fn resolve(&self, external_id: &str) -> Option<NodeId> {
        self.by_external.read().get(external_id).copied()
    }

    /// Returns the external id of a node.
    #[must_use]
    pub fn external_id(&self, node: NodeId) -> Option<String> {
        self.external_ids.read().get(node).cloned()
    }

    /// Returns the index parameters.
    #[must_use]
    pub fn params(&self) -> &HnswParams {
        &self.params
    }

    /// Returns the distance metric.
    #[must_use]
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Returns the distance comparator.
    #[must_use]
    pub fn comparator(&self) -> DistanceComparator {
        self.comparator
    }

    /// Inserts a vector under an external id.
    ///
    /// # Errors
    ///
    /// Fails on dimension mismatch or a duplicate external id.
    pub fn insert(&self, external_id: &str, vector: Vec<f32>) -> Result<NodeId> {
        if vector.len() != self.params.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.params.dimensions,
                actual: vector.len(),
            });
        }
        if self.resolve(external_id).is_some() {
            return Err(Error::UniqueViolation(external_id.to_string()));
        }

        let node = {
            let mut vectors = self.vectors.write();
            let id = vectors.len();
            vectors.push(vector.clone());
            self.external_ids.write().push(external_id.to_string());
            self.by_external.write().insert(external_id.to_string(), id);
            id
        };

        let node_level = self.assigner.assign(external_id);
        self.levels.write().push(node_level);

        {
            let mut layers = self.layers.write();
            while layers.len() <= node_level {
                layers.push(MemoryLayer::new(node + 1));
            }
            for layer in layers.iter_mut() {
                layer.ensure_capacity(node);
            }
        }

        let entry_point = self.entry_point();
        if let Some(ep) = entry_point {
            let max_layer = self.max_layer();
            let mut cur = ep;
            let mut cur_dist = self.distance_between_vec(&vector, ep);

            for layer in ((node_level + 1)..=max_layer).rev() {
                (cur, cur_dist) = self.greedy_step(&vector, cur, cur_dist, layer);
            }

            for layer in (0..=node_level.min(max_layer)).rev() {
                let found =
                    self.search_layer(&vector, cur, self.params.ef_construction, layer);
                if let Some(&(c, _)) = found.first() {
                    cur = c;
                }

                let selected = select_diverse(found, self.params.m, self.comparator, |a, b| {
                    Ok(self.distance_between(a, b))
                })?;

                let layers = self.layers.read();
                layers[layer]
                    .set_neighbors(node, selected.iter().map(|&(id, _)| id).collect());

                for &(neighbor, _) in &selected {
                    self.link_back(&layers[layer], neighbor, node, layer)?;
                }
            }
        }

        if entry_point.is_none() || node_level > self.max_layer() {
            self.max_layer.store(node_level, Ordering::Release);
            *self.entry_point.write() = Some(node);
        }

        Ok(node)
    }

    /// Searches the `k` nearest nodes with an explicit `ef`.
    ///
    /// # Errors
    ///
    /// Fails on dimension mismatch.
    pub fn search(&self, query: &[f32], k: usize, ef: usize) -> Result<Vec<(NodeId, f32)>> {
        if query.len() != self.params.dimensions {
            return Err(Error::DimensionMismatch {
                expected: self.params.dimensions,
                actual: query.len(),
            });
        }
        let Some(ep) = self.entry_point() else {
            return Ok(Vec::new());
        };

        let mut cur = ep;
        let mut cur_dist = self.distance_between_vec(query, ep);
        for layer in (1..=self.max_layer()).rev() {
            (cur, cur_dist) = self.greedy_step(query, cur, cur_dist, layer);
        }

        let mut found = self.search_layer(query, cur, ef.max(k), 0);
        found.truncate(k);
        Ok(found)
    }

    /// Iterates all nodes as snapshot records, in insertion order.
    pub fn nodes(&self) -> impl Iterator<Item = SnapshotNode> + '_ {
        (0..self.len()).map(|node| self.snapshot_node(node))
    }

    fn snapshot_node(&self, node: NodeId) -> SnapshotNode {
        let max_level = self.node_level(node);
        let layers = self.layers.read();
        let connections = (0..=max_level)
            .map(|l| layers[l].neighbors_of(node))
            .collect();
        SnapshotNode {
            node,
            external_id: self.external_ids.read()[node].clone(),
            vector: self.vectors.read()[node].clone(),
            max_level,
            connections,
        }
    }

    /// Saves the index to a bincode snapshot file.
    ///
    /// # Errors
    ///
    /// Fails on io or serialization errors.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = std::fs::File::create(path.as_ref())?;
        let writer = std::io::BufWriter::new(file);

        let connections: Vec<Vec<Vec<NodeId>>> = self
            .nodes()
            .map(|snapshot| snapshot.connections)
            .collect();

        let snapshot = SnapshotFile {
            metric: self.metric,
            comparator: self.comparator,
            params: SnapshotParams {
                dimensions: self.params.dimensions,
                max_item_count: self.params.max_item_count,
                m: self.params.m,
                ef: self.params.ef,
                ef_construction: self.params.ef_construction,
            },
            entry_point: self.entry_point(),
            max_layer: self.max_layer(),
            external_ids: self.external_ids.read().clone(),
            vectors: self.vectors.read().clone(),
            levels: self.levels.read().clone(),
            connections,
        };

        bincode::serialize_into(writer, &snapshot)?;
        Ok(())
    }

    /// Loads an index from a bincode snapshot file.
    ///
    /// # Errors
    ///
    /// Fails on io or deserialization errors.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::File::open(path.as_ref())?;
        let reader = std::io::BufReader::new(file);
        let snapshot: SnapshotFile = bincode::deserialize_from(reader)?;

        let params = HnswParams::new(
            snapshot.params.dimensions,
            snapshot.params.m,
            snapshot.params.ef,
            snapshot.params.ef_construction,
            snapshot.params.max_item_count,
        )?;

        let count = snapshot.vectors.len();
        let mut layers: Vec<MemoryLayer> =
            (0..=snapshot.max_layer).map(|_| MemoryLayer::new(count)).collect();
        for (node, connections) in snapshot.connections.iter().enumerate() {
            for (level, neighbors) in connections.iter().enumerate() {
                layers[level].set_neighbors(node, neighbors.clone());
            }
        }

        let by_external = snapshot
            .external_ids
            .iter()
            .enumerate()
            .map(|(node, id)| (id.clone(), node))
            .collect();

        let assigner = LevelAssigner::new(params.level_lambda);
        Ok(Self {
            metric: snapshot.metric,
            comparator: snapshot.comparator,
            params,
            assigner,
            vectors: RwLock::new(snapshot.vectors),
            external_ids: RwLock::new(snapshot.external_ids),
            by_external: RwLock::new(by_external),
            levels: RwLock::new(snapshot.levels),
            layers: RwLock::new(layers),
            entry_point: RwLock::new(snapshot.entry_point),
            max_layer: AtomicUsize::new(snapshot.max_layer),
        })
    }

    fn vector_of(&self, node: NodeId) -> Vec<f32> {
        self.vectors.read()[node].clone()
    }

    fn distance_between_vec(&self, query: &[f32], node: NodeId) -> f32 {
        self.metric.calculate(query, &self.vector_of(node))
    }

    fn distance_between(&self, a: NodeId, b: NodeId) -> f32 {
        let vectors = self.vectors.read();
        self.metric.calculate(&vectors[a], &vectors[b])
    }

    /// One greedy descent step: move to the closest out-neighbor until no
    /// neighbor improves.
    fn greedy_step(
        &self,
        query: &[f32],
        mut best: NodeId,
        mut best_dist: f32,
        layer: usize,
    ) -> (NodeId, f32) {
        loop {
            let neighbors = self.layers.read()[layer].neighbors_of(best);
            let mut improved = false;

            for neighbor in neighbors {
                let dist = self.distance_between_vec(query, neighbor);
                if self.comparator.lt(dist, best_dist) {
                    best = neighbor;
                    best_dist = dist;
                    improved = true;
                }
            }

            if !improved {
                return (best, best_dist);
            }
        }
    }

    /// Best-first search of one layer; returns up to `ef` nodes ascending
    /// by distance.
    fn search_layer(
        &self,
        query: &[f32],
        entry: NodeId,
        ef: usize,
        layer: usize,
    ) -> Vec<(NodeId, f32)> {
        let mut visited: FxHashSet<NodeId> = FxHashSet::default();
        let mut candidates: BinaryHeap<Reverse<(OrderedFloat, NodeId)>> = BinaryHeap::new();
        let mut top: BinaryHeap<(OrderedFloat, NodeId)> = BinaryHeap::new();

        let entry_key = self.comparator.sort_key(self.distance_between_vec(query, entry));
        candidates.push(Reverse((OrderedFloat(entry_key), entry)));
        top.push((OrderedFloat(entry_key), entry));
        visited.insert(entry);

        while let Some(Reverse((OrderedFloat(key), node))) = candidates.pop() {
            let farthest = top.peek().map_or(f32::INFINITY, |&(OrderedFloat(k), _)| k);
            if key > farthest && top.len() >= ef {
                break;
            }

            for neighbor in self.layers.read()[layer].neighbors_of(node) {
                if visited.insert(neighbor) {
                    let n_key = self
                        .comparator
                        .sort_key(self.distance_between_vec(query, neighbor));
                    let farthest = top.peek().map_or(f32::INFINITY, |&(OrderedFloat(k), _)| k);

                    if top.len() < ef || n_key < farthest {
                        candidates.push(Reverse((OrderedFloat(n_key), neighbor)));
                        top.push((OrderedFloat(n_key), neighbor));
                        if top.len() > ef {
                            top.pop();
                        }
                    }
                }
            }
        }

        let mut result: Vec<(NodeId, f32)> = top
            .into_iter()
            .map(|(OrderedFloat(key), node)| (node, self.comparator.sort_key(key)))
            .collect();
        result.sort_by(|a, b| self.comparator.cmp(a.1, b.1).then(a.0.cmp(&b.0)));
        result
    }

    /// Adds the back-edge `neighbor -> node`, re-pruning the neighborhood
    /// through the diversification heuristic when it overflows its cap.
    fn link_back(
        &self,
        layer_ref: &MemoryLayer,
        neighbor: NodeId,
        node: NodeId,
        layer: usize,
    ) -> Result<()> {
        let cap = self.params.degree_cap(layer);
        let current = layer_ref.neighbors_of(neighbor);

        if current.len() < cap {
            layer_ref.push_neighbor(neighbor, node);
            return Ok(());
        }

        let mut candidates: Vec<(NodeId, f32)> = Vec::with_capacity(current.len() + 1);
        candidates.push((node, self.distance_between(neighbor, node)));
        for n in current {
            candidates.push((n, self.distance_between(neighbor, n)));
        }
        candidates.sort_by(|a, b| self.comparator.cmp(a.1, b.1));

        let kept = select_diverse(candidates, cap, self.comparator, |a, b| {
            Ok(self.distance_between(a, b))
        })?;
        layer_ref.set_neighbors(neighbor, kept.into_iter().map(|(id, _)| id).collect());
        Ok(())
    }
}
