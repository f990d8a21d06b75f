//! HNSW (Hierarchical Navigable Small World) index implementations.
//!
//! Two renditions of the same algorithm live here:
//!
//! - [`HnswIndex`]: the persistent index. Items are property-graph vertices,
//!   layer adjacency is typed directed edges, searches walk the storage
//!   engine. Supports concurrent inserts.
//! - [`MemoryHnsw`]: the in-memory index, used standalone or as the origin
//!   the [`BulkImporter`] streams into a persistent graph.
//!
//! Both share the deterministic level assigner, the neighbor
//! diversification heuristic, and the comparator-keyed heap ordering, so a
//! bulk-imported graph searches exactly like its origin.
//!
//! # Module Organization
//!
//! - `params`: index parameters and their derivations
//! - `level`: id-seeded geometric layer assignment
//! - `ordered`: total-ordered f32 sort keys for the heaps
//! - `heuristic`: neighbor selection by diversification
//! - `sync`: vertex lock registry and the excluded-candidate set
//! - `memory`: the in-memory index and its bincode snapshots
//! - `descriptor`: the JSON parameter descriptor
//! - `import`: batched bulk ingestion
//! - `index`: the persistent index (builder, search, insert)

mod descriptor;
mod heuristic;
mod import;
mod index;
mod level;
mod memory;
mod ordered;
mod params;
mod sync;

#[cfg(test)]
mod heuristic_tests;
#[cfg(test)]
mod index_tests;

// ============================================================================
// Public API
// ============================================================================
pub use import::{BulkImporter, ImportReport};
pub use index::{HnswIndex, HnswIndexBuilder};
pub use level::LevelAssigner;
pub use memory::{MemoryHnsw, NodeId, SnapshotNode};
pub use params::HnswParams;
