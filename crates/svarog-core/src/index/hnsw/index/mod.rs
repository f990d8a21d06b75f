//! The persistent graph-backed index.
//!
//! `HnswIndex` materializes HNSW adjacency as typed directed edges of a
//! property graph behind [`GraphStore`]: one edge-type per layer, the layer
//! number appended to the configured prefix. Items are vertices created by
//! the caller and *registered* through [`add`](HnswIndex::add); search never
//! copies the graph into memory.
//!
//! # Module organization
//!
//! - `mod`: struct, accessors, entry-point handling, `get`/`remove`,
//!   descriptor round-trip
//! - `builder`: the chainable construction surface
//! - `search`: greedy descent and best-first base-layer search
//! - `insert`: the concurrent registration protocol

mod builder;
mod insert;
mod search;

pub use builder::HnswIndexBuilder;

use crate::distance::{DistanceComparator, DistanceMetric};
use crate::error::{Error, Result};
use crate::graph::{GraphAdapter, GraphStore, VertexCache, VertexId, VertexRecord};
use crate::index::hnsw::descriptor::{self, Descriptor};
use crate::index::hnsw::level::LevelAssigner;
use crate::index::hnsw::params::HnswParams;
use crate::index::hnsw::sync::{ExcludedSet, VertexLocks};
use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Persistent, graph-backed HNSW index.
pub struct HnswIndex {
    adapter: GraphAdapter,
    metric: DistanceMetric,
    comparator: DistanceComparator,
    params: HnswParams,
    /// Query-time candidate list size; the one parameter mutable after
    /// construction.
    ef: AtomicUsize,
    /// Entry point of every descent. Reads are lock-free; writes happen
    /// only under `global`.
    entry_point: ArcSwapOption<VertexId>,
    /// The index-wide insert lock: guards entry-point promotion, level
    /// assignment, and the idempotence gate.
    global: Mutex<()>,
    vertex_locks: VertexLocks,
    excluded: ExcludedSet,
    assigner: LevelAssigner,
    transaction_batch_size: usize,
}

impl HnswIndex {
    /// Starts building an index over `dimensions`-sized vectors.
    #[must_use]
    pub fn builder(dimensions: usize, metric: DistanceMetric) -> HnswIndexBuilder {
        HnswIndexBuilder::new(dimensions, metric)
    }

    pub(crate) fn from_parts(
        adapter: GraphAdapter,
        metric: DistanceMetric,
        comparator: DistanceComparator,
        params: HnswParams,
        ef: usize,
        entry_point: Option<VertexId>,
        transaction_batch_size: usize,
    ) -> Self {
        let assigner = LevelAssigner::new(params.level_lambda);
        Self {
            adapter,
            metric,
            comparator,
            params,
            ef: AtomicUsize::new(ef),
            entry_point: ArcSwapOption::from(entry_point.map(Arc::new)),
            global: Mutex::new(()),
            vertex_locks: VertexLocks::new(),
            excluded: ExcludedSet::new(),
            assigner,
            transaction_batch_size,
        }
    }

    /// Reopens an index from its JSON descriptor.
    ///
    /// Resolves the distance function and the comparator through their
    /// registries and re-creates the unique secondary index on the external
    /// id if the engine lost it.
    ///
    /// # Errors
    ///
    /// Fails on a malformed descriptor, an unknown registry name, or a
    /// storage error.
    pub fn open(
        store: Arc<dyn GraphStore>,
        descriptor: &serde_json::Value,
        cache: Option<VertexCache>,
    ) -> Result<Self> {
        let Descriptor {
            params,
            metric,
            comparator,
            ef,
            entry_point,
        } = descriptor::read(descriptor)?;

        let adapter = GraphAdapter::new(
            store,
            &params.vertex_type,
            &params.edge_type_prefix,
            &params.id_property,
            cache,
        );
        adapter.ensure_id_index()?;

        tracing::info!(
            dimensions = params.dimensions,
            m = params.m,
            metric = metric.name(),
            "opened index from descriptor"
        );

        Ok(Self::from_parts(
            adapter,
            metric,
            comparator,
            params,
            ef,
            entry_point,
            crate::config::SvarogConfig::default().import.transaction_batch_size,
        ))
    }

    /// Renders this index as its JSON descriptor. The graph itself lives in
    /// the storage engine and is not part of the descriptor.
    #[must_use]
    pub fn to_descriptor(&self) -> serde_json::Value {
        descriptor::write(&Descriptor {
            params: self.params.clone(),
            metric: self.metric,
            comparator: self.comparator,
            ef: self.ef(),
            entry_point: self.entry_point(),
        })
    }

    /// Vector dimensionality.
    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.params.dimensions
    }

    /// Target out-degree per upper layer.
    #[must_use]
    pub fn m(&self) -> usize {
        self.params.m
    }

    /// Query-time candidate list size.
    #[must_use]
    pub fn ef(&self) -> usize {
        self.ef.load(Ordering::Acquire)
    }

    /// Updates the query-time candidate list size.
    pub fn set_ef(&self, ef: usize) {
        self.ef.store(ef.max(1), Ordering::Release);
    }

    /// Construction-time candidate list size.
    #[must_use]
    pub fn ef_construction(&self) -> usize {
        self.params.ef_construction
    }

    /// Advisory capacity bound.
    #[must_use]
    pub fn max_item_count(&self) -> usize {
        self.params.max_item_count
    }

    /// The distance metric.
    #[must_use]
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// The distance comparator.
    #[must_use]
    pub fn comparator(&self) -> DistanceComparator {
        self.comparator
    }

    /// Full parameter set.
    #[must_use]
    pub fn params(&self) -> &HnswParams {
        &self.params
    }

    /// Number of indexed vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.adapter.vertex_count()
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The current entry-point vertex, if any. May be transiently stale
    /// with respect to a concurrent insert; the old entry point stays
    /// reachable, at worst adding a bounded descent.
    #[must_use]
    pub fn entry_point(&self) -> Option<VertexId> {
        self.entry_point.load_full().map(|v| *v)
    }

    pub(crate) fn set_entry_point(&self, v: Option<VertexId>) {
        self.entry_point.store(v.map(Arc::new));
    }

    pub(crate) fn adapter(&self) -> &GraphAdapter {
        &self.adapter
    }

    pub(crate) fn transaction_batch_size(&self) -> usize {
        self.transaction_batch_size
    }

    pub(super) fn excluded(&self) -> &ExcludedSet {
        &self.excluded
    }

    pub(super) fn vertex_locks(&self) -> &VertexLocks {
        &self.vertex_locks
    }

    pub(super) fn global(&self) -> &Mutex<()> {
        &self.global
    }

    pub(super) fn assigner(&self) -> &LevelAssigner {
        &self.assigner
    }

    /// Resolves an external id to its vertex.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn resolve(&self, external_id: &str) -> Result<Option<VertexId>> {
        self.adapter.vertex_by_external_id(external_id)
    }

    /// Loads the record behind a vertex identity, e.g. a search result.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist.
    pub fn vertex(&self, v: VertexId) -> Result<Arc<VertexRecord>> {
        self.adapter.load(v)
    }

    /// Returns the external id of a vertex.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist or lacks the id property.
    pub fn external_id(&self, v: VertexId) -> Result<String> {
        self.adapter.read_external_id(v)
    }

    /// Loads the vertex registered under an external id; `None` when the id
    /// is unknown.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn get(&self, external_id: &str) -> Result<Option<Arc<VertexRecord>>> {
        match self.resolve(external_id)? {
            Some(v) => Ok(Some(self.adapter.load(v)?)),
            None => Ok(None),
        }
    }

    /// Removes the vertex registered under an external id, with all its
    /// layer edges. Returns false for an unknown id.
    ///
    /// When the removed vertex is the entry point, the highest-level
    /// remaining out-neighbor takes over; with no neighbors left the whole
    /// graph is scanned for the highest-level vertex.
    ///
    /// Removal is not synchronized with in-flight `add` calls beyond the
    /// entry-point handoff; callers must serialize `remove` with concurrent
    /// inserts.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn remove(&self, external_id: &str) -> Result<bool> {
        let Some(vertex) = self.resolve(external_id)? else {
            return Ok(false);
        };

        let _global = self.global.lock();
        if self.entry_point() == Some(vertex) {
            let successor = self.entry_point_successor(vertex)?;
            self.set_entry_point(successor);
            tracing::debug!(removed = vertex, ?successor, "entry point reassigned");
        }

        self.adapter.delete_vertex(vertex)
    }

    /// Picks the entry point replacing `vertex`: its highest-level
    /// out-neighbor, else the highest-level vertex in the graph.
    fn entry_point_successor(&self, vertex: VertexId) -> Result<Option<VertexId>> {
        let top = self.adapter.read_max_level(vertex)?;
        let mut best: Option<(usize, VertexId)> = None;

        for level in (0..=top).rev() {
            for n in self.adapter.out_neighbors(vertex, level)? {
                if n == vertex {
                    continue;
                }
                let n_level = self.adapter.read_max_level(n)?;
                if best.is_none_or(|(l, _)| n_level > l) {
                    best = Some((n_level, n));
                }
            }
        }

        if best.is_none() {
            tracing::warn!(vertex, "entry point has no neighbors, scanning graph");
            for candidate in self.adapter.vertex_ids() {
                if candidate == vertex {
                    continue;
                }
                let level = self.adapter.read_max_level(candidate)?;
                if best.is_none_or(|(l, _)| level > l) {
                    best = Some((level, candidate));
                }
            }
        }

        Ok(best.map(|(_, v)| v))
    }

    /// Distance from a query vector to a stored vertex.
    pub(crate) fn distance_to(&self, query: &[f32], v: VertexId) -> Result<f32> {
        let record = self.adapter.read_vector(v)?;
        let vector = record
            .vector()
            .ok_or_else(|| Error::Storage(format!("vertex {v} has no vector")))?;
        Ok(self.metric.calculate(query, vector))
    }

    /// Distance between two stored vertices.
    pub(crate) fn distance_between(&self, a: VertexId, b: VertexId) -> Result<f32> {
        let record = self.adapter.read_vector(a)?;
        let vector = record
            .vector()
            .ok_or_else(|| Error::Storage(format!("vertex {a} has no vector")))?;
        self.distance_to(vector, b)
    }
}
