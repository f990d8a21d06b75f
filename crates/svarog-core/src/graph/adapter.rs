//! Index-facing facade over the storage contract.
//!
//! `GraphAdapter` binds a [`GraphStore`] to one index's schema: the vertex
//! type, the property names the descriptor chose for the external id and the
//! vector, and the per-layer edge-type naming convention
//! (`<edge_type_prefix><level>`). An optional [`VertexCache`] short-circuits
//! record loads.

use crate::error::{Error, Result};
use crate::graph::store::GraphStore;
use crate::graph::{VertexCache, VertexId, VertexRecord};
use serde_json::{json, Value};
use std::sync::Arc;

/// Property holding a vertex's top HNSW layer. Absent is read as 0.
pub(crate) const MAX_LEVEL_PROPERTY: &str = "vectorMaxLevel";

/// Schema-bound facade over a graph engine.
pub struct GraphAdapter {
    store: Arc<dyn GraphStore>,
    vertex_type: String,
    edge_type_prefix: String,
    id_property: String,
    cache: Option<VertexCache>,
}

impl GraphAdapter {
    /// Binds a store to an index schema.
    #[must_use]
    pub fn new(
        store: Arc<dyn GraphStore>,
        vertex_type: &str,
        edge_type_prefix: &str,
        id_property: &str,
        cache: Option<VertexCache>,
    ) -> Self {
        Self {
            store,
            vertex_type: vertex_type.to_string(),
            edge_type_prefix: edge_type_prefix.to_string(),
            id_property: id_property.to_string(),
            cache,
        }
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn GraphStore> {
        &self.store
    }

    /// Returns the edge-type name carrying layer `level` adjacency.
    #[must_use]
    pub fn edge_type(&self, level: usize) -> String {
        format!("{}{}", self.edge_type_prefix, level)
    }

    /// Idempotently creates the unique secondary index on the external id.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn ensure_id_index(&self) -> Result<()> {
        self.store
            .ensure_unique_index(&self.vertex_type, &self.id_property)
    }

    /// Resolves a vertex by external id through the unique index.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn vertex_by_external_id(&self, id: &str) -> Result<Option<VertexId>> {
        self.store
            .lookup_unique(&self.vertex_type, &self.id_property, id)
    }

    /// Creates an indexed vertex carrying the external id and the vector.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UniqueViolation`] for a duplicate external id.
    pub fn create_vertex(&self, external_id: &str, vector: Vec<f32>) -> Result<VertexId> {
        let record = VertexRecord::new(&self.vertex_type)
            .with_property(&self.id_property, json!(external_id))
            .with_vector(vector);
        self.store.create_vertex(record)
    }

    /// Loads a vertex record, consulting the cache first.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist.
    pub fn load(&self, v: VertexId) -> Result<Arc<VertexRecord>> {
        if let Some(cache) = &self.cache {
            if let Some(record) = cache.get(v) {
                return Ok(record);
            }
            let record = Arc::new(self.store.load_vertex(v)?);
            cache.insert(v, Arc::clone(&record));
            return Ok(record);
        }
        Ok(Arc::new(self.store.load_vertex(v)?))
    }

    /// Reads the vector of a vertex.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist or carries no vector.
    pub fn read_vector(&self, v: VertexId) -> Result<Arc<VertexRecord>> {
        let record = self.load(v)?;
        if record.vector().is_none() {
            return Err(Error::Storage(format!("vertex {v} has no vector")));
        }
        Ok(record)
    }

    /// Reads the external id of a vertex.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist or lacks the id property.
    pub fn read_external_id(&self, v: VertexId) -> Result<String> {
        let record = self.load(v)?;
        match record.property(&self.id_property) {
            Some(Value::String(s)) => Ok(s.clone()),
            Some(other) => Ok(other.to_string()),
            None => Err(Error::Storage(format!(
                "vertex {v} lacks property '{}'",
                self.id_property
            ))),
        }
    }

    /// Reads the top layer of a vertex; an absent property reads as 0.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist.
    #[allow(clippy::cast_possible_truncation)]
    pub fn read_max_level(&self, v: VertexId) -> Result<usize> {
        let record = self.load(v)?;
        Ok(record
            .property(MAX_LEVEL_PROPERTY)
            .and_then(Value::as_u64)
            .unwrap_or(0) as usize)
    }

    /// Persists the top layer of a vertex.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist.
    pub fn write_max_level(&self, v: VertexId, level: usize) -> Result<()> {
        self.store
            .set_vertex_property(v, MAX_LEVEL_PROPERTY, json!(level))?;
        if let Some(cache) = &self.cache {
            cache.invalidate(v);
        }
        Ok(())
    }

    /// Idempotently registers the edge type for a layer.
    pub fn ensure_edge_type(&self, level: usize) {
        self.store.ensure_edge_type(&self.edge_type(level));
    }

    /// Snapshot of the out-neighbors of `v` at a layer.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist.
    pub fn out_neighbors(&self, v: VertexId, level: usize) -> Result<Vec<VertexId>> {
        self.store.out_neighbors(v, &self.edge_type(level))
    }

    /// Out-degree of `v` at a layer.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist.
    pub fn out_degree(&self, v: VertexId, level: usize) -> Result<usize> {
        self.store.out_degree(v, &self.edge_type(level))
    }

    /// Creates a directed layer edge. Callers ensure no duplicates.
    ///
    /// # Errors
    ///
    /// Fails if either endpoint does not exist.
    pub fn add_edge(&self, from: VertexId, to: VertexId, level: usize) -> Result<()> {
        self.store.add_edge(from, to, &self.edge_type(level))
    }

    /// Atomically replaces the out-edges of `v` at a layer.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist.
    pub fn replace_out_edges(
        &self,
        v: VertexId,
        level: usize,
        targets: &[VertexId],
    ) -> Result<()> {
        self.store
            .replace_out_edges(v, &self.edge_type(level), targets)
    }

    /// Deletes a vertex with all incident edges.
    ///
    /// # Errors
    ///
    /// Propagates storage errors.
    pub fn delete_vertex(&self, v: VertexId) -> Result<bool> {
        if let Some(cache) = &self.cache {
            cache.invalidate(v);
        }
        self.store.delete_vertex(v)
    }

    /// Number of indexed vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.store.vertex_count()
    }

    /// Identities of all vertices. Full scan; maintenance paths only.
    #[must_use]
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        self.store.vertex_ids()
    }
}
