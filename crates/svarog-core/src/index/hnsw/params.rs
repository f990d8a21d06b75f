//! Index parameters.
//!
//! `HnswParams` is the immutable part of the index descriptor. Derived
//! fields are computed once at construction: `max_m = m`, `max_m0 = 2 * m`,
//! `level_lambda = 1 / ln(m)`, and `ef_construction` is clamped up to `m`
//! so construction never considers fewer candidates than it links.

use crate::config::SvarogConfig;
use crate::error::{Error, Result};

/// Default vertex type carrying indexed items.
pub const DEFAULT_VERTEX_TYPE: &str = "Vector";
/// Default edge-type prefix; layer `l` edges live in `<prefix><l>`.
pub const DEFAULT_EDGE_TYPE_PREFIX: &str = "VectorNear";
/// Default property holding the external id.
pub const DEFAULT_ID_PROPERTY: &str = "id";
/// Default property name the vector is published under.
pub const DEFAULT_VECTOR_PROPERTY: &str = "vector";

/// Immutable HNSW index parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct HnswParams {
    /// Vector dimensionality; every indexed vector must match.
    pub dimensions: usize,
    /// Advisory capacity bound. Stored and surfaced, not enforced by `add`.
    pub max_item_count: usize,
    /// Target out-degree per upper layer.
    pub m: usize,
    /// Out-degree cap above the base layer (`= m`).
    pub max_m: usize,
    /// Out-degree cap at the base layer (`= 2 * m`).
    pub max_m0: usize,
    /// Level multiplier `1 / ln(m)` for the geometric layer draw.
    pub level_lambda: f64,
    /// Default size of the dynamic candidate list at query time.
    pub ef: usize,
    /// Size of the dynamic candidate list during construction.
    pub ef_construction: usize,
    /// Vertex type of indexed items.
    pub vertex_type: String,
    /// Edge-type prefix for layer adjacency.
    pub edge_type_prefix: String,
    /// Property holding the external id (unique-indexed).
    pub id_property: String,
    /// Property name the vector is published under.
    pub vector_property: String,
}

impl HnswParams {
    /// Creates parameters with derived fields computed and default schema
    /// names.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for zero dimensions or `m < 2`.
    pub fn new(
        dimensions: usize,
        m: usize,
        ef: usize,
        ef_construction: usize,
        max_item_count: usize,
    ) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::Config("dimensions must be positive".to_string()));
        }
        if m < 2 {
            return Err(Error::Config(format!("m must be at least 2, got {m}")));
        }
        if ef == 0 {
            return Err(Error::Config("ef must be at least 1".to_string()));
        }

        #[allow(clippy::cast_precision_loss)]
        let level_lambda = 1.0 / (m as f64).ln();

        Ok(Self {
            dimensions,
            max_item_count,
            m,
            max_m: m,
            max_m0: 2 * m,
            level_lambda,
            ef,
            ef_construction: ef_construction.max(m),
            vertex_type: DEFAULT_VERTEX_TYPE.to_string(),
            edge_type_prefix: DEFAULT_EDGE_TYPE_PREFIX.to_string(),
            id_property: DEFAULT_ID_PROPERTY.to_string(),
            vector_property: DEFAULT_VECTOR_PROPERTY.to_string(),
        })
    }

    /// Creates parameters from configuration defaults.
    ///
    /// # Errors
    ///
    /// Propagates parameter validation failures.
    pub fn from_config(dimensions: usize, config: &SvarogConfig) -> Result<Self> {
        Self::new(
            dimensions,
            config.index.m,
            config.index.ef,
            config.index.ef_construction,
            config.index.max_item_count,
        )
    }

    /// Out-degree cap for a layer.
    #[must_use]
    pub const fn degree_cap(&self, level: usize) -> usize {
        if level == 0 {
            self.max_m0
        } else {
            self.max_m
        }
    }
}
