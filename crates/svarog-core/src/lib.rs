//! # Svarog Core
//!
//! A persistent, graph-backed HNSW index for approximate nearest-neighbor
//! search.
//!
//! Indexed items are vertices of a property graph; HNSW layer adjacency is
//! materialized as typed directed edges, one edge-type per layer. The index
//! serializes as a compact JSON parameter descriptor while the graph itself
//! stays in the storage engine, behind the [`GraphStore`] contract.
//!
//! ## Features
//!
//! - **Persistent graph layout**: searches walk the storage engine, nothing
//!   is rebuilt on open
//! - **Concurrent inserts**: an early-released index lock plus per-vertex
//!   locks let parallel registrations proceed on disjoint work
//! - **Reproducible builds**: layer assignment is seeded by the external
//!   id, so the same data always produces the same hierarchy
//! - **Bulk ingestion**: a pre-built [`MemoryHnsw`] streams into the graph
//!   in bounded transactions
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use svarog_core::{DistanceMetric, HnswIndex};
//!
//! let index = HnswIndex::builder(768, DistanceMetric::Cosine)
//!     .m(16)
//!     .ef(64)
//!     .build()?;
//!
//! index.insert("doc-1", embedding)?;
//! let nearest = index.find_nearest(&query, 10)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod distance;
pub mod error;
pub mod graph;
pub mod index;

#[cfg(test)]
mod error_tests;

pub use config::SvarogConfig;
pub use distance::{DistanceComparator, DistanceMetric};
pub use error::{Error, Result};
pub use graph::{GraphStore, MemoryGraph, VertexCache, VertexId, VertexRecord};
pub use index::hnsw::{
    BulkImporter, HnswIndex, HnswIndexBuilder, HnswParams, ImportReport, MemoryHnsw,
};
