//! The storage-engine contract.
//!
//! Everything the index needs from a graph engine, and nothing more: vertex
//! CRUD, property reads/writes, typed directed edges, a unique secondary
//! index on one property per vertex type, and batch transaction boundaries.
//! [`MemoryGraph`](super::MemoryGraph) is the bundled reference engine;
//! persistent engines implement the same trait.

use crate::error::Result;
use crate::graph::{VertexId, VertexRecord};
use serde_json::Value;

/// Synchronous facade over a property-graph storage engine.
///
/// # Edge semantics
///
/// Edges are directed and typed by name. `add_edge` performs no uniqueness
/// check; callers ensure no duplicates. Layer adjacency is stored one
/// edge-type per layer (`<edge_type_prefix><level>`), so external clients
/// can read the graph with the same naming convention.
///
/// # Transactions
///
/// `begin`/`commit` mark batch boundaries for bulk operations. Engines may
/// make writes visible immediately (the in-memory engine does); the contract
/// only requires that a commit durably closes the batch.
pub trait GraphStore: Send + Sync {
    /// Creates a vertex, enforcing any unique index that covers it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UniqueViolation`](crate::Error::UniqueViolation) if
    /// an indexed property value is already taken; the vertex is not created.
    fn create_vertex(&self, record: VertexRecord) -> Result<VertexId>;

    /// Loads a full vertex record by identity.
    ///
    /// # Errors
    ///
    /// Returns [`Error::VertexNotFound`](crate::Error::VertexNotFound) if the
    /// vertex does not exist.
    fn load_vertex(&self, v: VertexId) -> Result<VertexRecord>;

    /// Reads one property of a vertex. `None` when the property is absent.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist.
    fn vertex_property(&self, v: VertexId, name: &str) -> Result<Option<Value>>;

    /// Writes one property of a vertex, atomic within the host transaction.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist.
    fn set_vertex_property(&self, v: VertexId, name: &str, value: Value) -> Result<()>;

    /// Reads the vector embedding of a vertex.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist or carries no vector.
    fn vertex_vector(&self, v: VertexId) -> Result<Vec<f32>>;

    /// Idempotently creates a unique secondary index on `(vertex_type, property)`.
    ///
    /// # Errors
    ///
    /// Fails only on storage errors; re-creation is a no-op.
    fn ensure_unique_index(&self, vertex_type: &str, property: &str) -> Result<()>;

    /// Resolves a vertex through the unique index. O(log N) or better.
    ///
    /// Keys are the canonical string rendering of the property value.
    ///
    /// # Errors
    ///
    /// Fails if no such index exists.
    fn lookup_unique(&self, vertex_type: &str, property: &str, key: &str) -> Result<Option<VertexId>>;

    /// Idempotently registers an edge type (lazy schema creation).
    fn ensure_edge_type(&self, name: &str);

    /// Returns true if the edge type has been registered.
    fn edge_type_exists(&self, name: &str) -> bool;

    /// Snapshot of the out-neighbors of `v` under one edge type, in
    /// insertion order.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist.
    fn out_neighbors(&self, v: VertexId, edge_type: &str) -> Result<Vec<VertexId>>;

    /// Out-degree of `v` under one edge type.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist.
    fn out_degree(&self, v: VertexId, edge_type: &str) -> Result<usize>;

    /// Creates a directed edge. No uniqueness check.
    ///
    /// # Errors
    ///
    /// Fails if either endpoint does not exist.
    fn add_edge(&self, from: VertexId, to: VertexId, edge_type: &str) -> Result<()>;

    /// Atomically replaces the out-edges of `v` under one edge type.
    ///
    /// Old edges are removed and the new set inserted as one storage
    /// operation, so out-degree bounds hold at every observable point.
    ///
    /// # Errors
    ///
    /// Fails if the vertex does not exist.
    fn replace_out_edges(&self, v: VertexId, edge_type: &str, targets: &[VertexId]) -> Result<()>;

    /// Deletes a vertex and all incident edges, both directions.
    ///
    /// Returns false if the vertex did not exist.
    ///
    /// # Errors
    ///
    /// Fails only on storage errors.
    fn delete_vertex(&self, v: VertexId) -> Result<bool>;

    /// Number of vertices currently stored.
    fn vertex_count(&self) -> usize;

    /// Identities of all stored vertices. Full scan; used by maintenance
    /// paths such as entry-point reassignment, not by search.
    fn vertex_ids(&self) -> Vec<VertexId>;

    /// Opens a transaction batch.
    ///
    /// # Errors
    ///
    /// Fails on storage errors.
    fn begin(&self) -> Result<()>;

    /// Commits the current transaction batch.
    ///
    /// # Errors
    ///
    /// Fails on storage errors; writes in the committed prefix stay durable.
    fn commit(&self) -> Result<()>;
}
