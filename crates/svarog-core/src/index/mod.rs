//! Index implementations.

pub mod hnsw;

pub use hnsw::{HnswIndex, HnswIndexBuilder, MemoryHnsw};
