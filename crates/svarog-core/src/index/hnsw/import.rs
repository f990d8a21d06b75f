//! Bulk ingestion of an in-memory index into the persistent graph.
//!
//! The importer rehydrates a pre-built [`MemoryHnsw`] in three passes, each
//! batched into fixed-size transactions: vertices first, then edge types for
//! every layer up to the observed maximum, then the layer edges themselves.
//! The origin guarantees duplicate-free adjacency lists, so edges are
//! written without deduplication. Import is single-threaded and must not
//! run concurrently with online inserts.

use crate::error::{Error, Result};
use crate::graph::VertexId;
use crate::index::hnsw::memory::MemoryHnsw;
use crate::index::hnsw::HnswIndex;

/// Counters reported by a completed import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Vertices materialized in pass 1.
    pub vertices: usize,
    /// Edges written in pass 3.
    pub edges: usize,
    /// Highest layer observed across the origin.
    pub max_level: usize,
}

/// Streams an in-memory index into a persistent one.
pub struct BulkImporter<'a> {
    index: &'a HnswIndex,
    batch_size: usize,
}

impl<'a> BulkImporter<'a> {
    /// Creates an importer with the index's configured batch size.
    #[must_use]
    pub fn new(index: &'a HnswIndex) -> Self {
        Self {
            index,
            batch_size: index.transaction_batch_size(),
        }
    }

    /// Overrides the transaction batch size.
    #[must_use]
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Imports every node and edge of `origin`.
    ///
    /// # Errors
    ///
    /// Fails when the origin's dimensionality differs from the index's, or
    /// on storage errors; committed batches stay durable.
    pub fn import(&self, origin: &MemoryHnsw) -> Result<ImportReport> {
        if origin.params().dimensions != self.index.dimensions() {
            return Err(Error::Config(format!(
                "origin dimensionality {} does not match index {}",
                origin.params().dimensions,
                self.index.dimensions()
            )));
        }

        let total = origin.len();
        if total == 0 {
            return Ok(ImportReport::default());
        }

        let adapter = self.index.adapter();
        let store = adapter.store();
        let mut mapping: Vec<VertexId> = vec![0; total];
        let mut max_level = 0_usize;

        // Pass 1: materialize vertices.
        let mut in_batch = 0_usize;
        let mut done = 0_usize;
        store.begin()?;
        for node in origin.nodes() {
            if in_batch == self.batch_size {
                store.commit()?;
                store.begin()?;
                tracing::info!(done, total, "import: vertices");
                in_batch = 0;
            }
            let vertex = adapter.create_vertex(&node.external_id, node.vector)?;
            if node.max_level > 0 {
                adapter.write_max_level(vertex, node.max_level)?;
            }
            mapping[node.node] = vertex;
            max_level = max_level.max(node.max_level);
            in_batch += 1;
            done += 1;
        }
        store.commit()?;

        if let Some(origin_entry) = origin.entry_point() {
            self.index.set_entry_point(Some(mapping[origin_entry]));
        }

        // Pass 2: pre-create every layer's edge type.
        for level in 0..=max_level {
            adapter.ensure_edge_type(level);
        }

        // Pass 3: wire edges.
        let mut edges = 0_usize;
        in_batch = 0;
        done = 0;
        store.begin()?;
        for node in origin.nodes() {
            if in_batch == self.batch_size {
                store.commit()?;
                store.begin()?;
                tracing::info!(done, total, edges, "import: edges");
                in_batch = 0;
            }
            let from = mapping[node.node];
            for (level, neighbors) in node.connections.iter().enumerate() {
                for &neighbor in neighbors {
                    adapter.add_edge(from, mapping[neighbor], level)?;
                    edges += 1;
                }
            }
            in_batch += 1;
            done += 1;
        }
        store.commit()?;

        tracing::info!(
            vertices = total,
            edges,
            max_level,
            "bulk import complete"
        );

        Ok(ImportReport {
            vertices: total,
            edges,
            max_level,
        })
    }
}
