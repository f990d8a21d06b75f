//! Chainable index construction.

use super::HnswIndex;
use crate::config::SvarogConfig;
use crate::distance::{DistanceComparator, DistanceMetric};
use crate::error::Result;
use crate::graph::{GraphAdapter, GraphStore, MemoryGraph, VertexCache};
use crate::index::hnsw::import::BulkImporter;
use crate::index::hnsw::memory::MemoryHnsw;
use crate::index::hnsw::params::HnswParams;
use std::sync::Arc;

/// Builder for [`HnswIndex`].
///
/// Every option defaults from [`SvarogConfig`]; unset schema names fall
/// back to the crate defaults. With no explicit store the index runs on a
/// fresh [`MemoryGraph`].
pub struct HnswIndexBuilder {
    dimensions: usize,
    metric: DistanceMetric,
    comparator: Option<DistanceComparator>,
    config: SvarogConfig,
    m: Option<usize>,
    ef: Option<usize>,
    ef_construction: Option<usize>,
    max_item_count: Option<usize>,
    store: Option<Arc<dyn GraphStore>>,
    vertex_type: Option<String>,
    edge_type_prefix: Option<String>,
    id_property: Option<String>,
    vector_property: Option<String>,
    cache_capacity: Option<usize>,
    transaction_batch_size: Option<usize>,
}

impl HnswIndexBuilder {
    /// Starts a builder for `dimensions`-sized vectors under `metric`.
    #[must_use]
    pub fn new(dimensions: usize, metric: DistanceMetric) -> Self {
        Self {
            dimensions,
            metric,
            comparator: None,
            config: SvarogConfig::default(),
            m: None,
            ef: None,
            ef_construction: None,
            max_item_count: None,
            store: None,
            vertex_type: None,
            edge_type_prefix: None,
            id_property: None,
            vector_property: None,
            cache_capacity: None,
            transaction_batch_size: None,
        }
    }

    /// Uses loaded configuration instead of built-in defaults.
    #[must_use]
    pub fn config(mut self, config: SvarogConfig) -> Self {
        self.config = config;
        self
    }

    /// Overrides the distance comparator (defaults to the metric's own).
    #[must_use]
    pub fn comparator(mut self, comparator: DistanceComparator) -> Self {
        self.comparator = Some(comparator);
        self
    }

    /// Sets the target out-degree per upper layer.
    #[must_use]
    pub fn m(mut self, m: usize) -> Self {
        self.m = Some(m);
        self
    }

    /// Sets the query-time candidate list size.
    #[must_use]
    pub fn ef(mut self, ef: usize) -> Self {
        self.ef = Some(ef);
        self
    }

    /// Sets the construction-time candidate list size.
    #[must_use]
    pub fn ef_construction(mut self, ef_construction: usize) -> Self {
        self.ef_construction = Some(ef_construction);
        self
    }

    /// Sets the advisory capacity bound.
    #[must_use]
    pub fn max_item_count(mut self, max_item_count: usize) -> Self {
        self.max_item_count = Some(max_item_count);
        self
    }

    /// Runs the index against an existing storage engine.
    #[must_use]
    pub fn store(mut self, store: Arc<dyn GraphStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Sets the vertex type of indexed items.
    #[must_use]
    pub fn vertex_type(mut self, vertex_type: &str) -> Self {
        self.vertex_type = Some(vertex_type.to_string());
        self
    }

    /// Sets the edge-type prefix; layer `l` edges live in `<prefix><l>`.
    #[must_use]
    pub fn edge_type(mut self, edge_type_prefix: &str) -> Self {
        self.edge_type_prefix = Some(edge_type_prefix.to_string());
        self
    }

    /// Sets the property holding the external id.
    #[must_use]
    pub fn id_property(mut self, id_property: &str) -> Self {
        self.id_property = Some(id_property.to_string());
        self
    }

    /// Sets the property name the vector is published under.
    #[must_use]
    pub fn vector_property(mut self, vector_property: &str) -> Self {
        self.vector_property = Some(vector_property.to_string());
        self
    }

    /// Enables a read-through vertex cache with the given capacity.
    #[must_use]
    pub fn cache(mut self, capacity: usize) -> Self {
        self.cache_capacity = Some(capacity);
        self
    }

    /// Sets the bulk-import transaction batch size.
    #[must_use]
    pub fn transaction_batch_size(mut self, batch_size: usize) -> Self {
        self.transaction_batch_size = Some(batch_size);
        self
    }

    /// Builds the index, creating the unique id index on the store.
    ///
    /// # Errors
    ///
    /// Fails on invalid parameters or storage errors.
    pub fn build(self) -> Result<HnswIndex> {
        let defaults = self.config.index;
        let mut params = HnswParams::new(
            self.dimensions,
            self.m.unwrap_or(defaults.m),
            self.ef.unwrap_or(defaults.ef),
            self.ef_construction.unwrap_or(defaults.ef_construction),
            self.max_item_count.unwrap_or(defaults.max_item_count),
        )?;
        if let Some(vertex_type) = self.vertex_type {
            params.vertex_type = vertex_type;
        }
        if let Some(prefix) = self.edge_type_prefix {
            params.edge_type_prefix = prefix;
        }
        if let Some(id_property) = self.id_property {
            params.id_property = id_property;
        }
        if let Some(vector_property) = self.vector_property {
            params.vector_property = vector_property;
        }

        let store = self
            .store
            .unwrap_or_else(|| Arc::new(MemoryGraph::new()) as Arc<dyn GraphStore>);
        let cache = self.cache_capacity.map(VertexCache::new);
        let adapter = GraphAdapter::new(
            store,
            &params.vertex_type,
            &params.edge_type_prefix,
            &params.id_property,
            cache,
        );
        adapter.ensure_id_index()?;

        let comparator = self
            .comparator
            .unwrap_or_else(|| self.metric.default_comparator());
        let ef = params.ef;
        let batch_size = self
            .transaction_batch_size
            .unwrap_or(self.config.import.transaction_batch_size);

        tracing::info!(
            dimensions = params.dimensions,
            m = params.m,
            ef_construction = params.ef_construction,
            metric = self.metric.name(),
            "index created"
        );

        Ok(HnswIndex::from_parts(
            adapter,
            self.metric,
            comparator,
            params,
            ef,
            None,
            batch_size,
        ))
    }

    /// Builds the index and bulk-imports an in-memory origin into it.
    ///
    /// # Errors
    ///
    /// Fails on build errors or anything [`BulkImporter::import`] fails on.
    pub fn seed(self, origin: &MemoryHnsw) -> Result<HnswIndex> {
        let index = self.build()?;
        BulkImporter::new(&index).import(origin)?;
        Ok(index)
    }
}
