//! Distance metrics and distance ordering for vector similarity.
//!
//! The index consumes distances abstractly: a [`DistanceMetric`] computes
//! `d(a, b)` and a [`DistanceComparator`] defines the total order on
//! distances. Both are resolvable by a stable registry name so a serialized
//! descriptor can be rehydrated without reflecting over types.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Distance metric for vector similarity calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DistanceMetric {
    /// Euclidean distance (L2 norm). Lower is closer.
    Euclidean,

    /// Cosine distance (`1 - cosine_similarity`). Lower is closer.
    /// Commonly used with text embeddings.
    Cosine,

    /// Inner product (dot product). Higher is closer; pairs with
    /// [`DistanceComparator::Reversed`] by default.
    InnerProduct,
}

impl DistanceMetric {
    /// Calculates the distance between two vectors using this metric.
    ///
    /// # Panics
    ///
    /// Panics if the vectors have different dimensions. Callers validate
    /// dimensions against the index descriptor before reaching this point.
    #[must_use]
    pub fn calculate(&self, a: &[f32], b: &[f32]) -> f32 {
        assert_eq!(a.len(), b.len(), "Vector dimensions must match");

        match self {
            Self::Euclidean => Self::euclidean_distance(a, b),
            Self::Cosine => 1.0 - Self::cosine_similarity(a, b),
            Self::InnerProduct => Self::dot_product(a, b),
        }
    }

    /// Returns the registry name of this metric, as stored in descriptors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Euclidean => "euclidean",
            Self::Cosine => "cosine",
            Self::InnerProduct => "inner_product",
        }
    }

    /// Resolves a metric from its registry name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownDistanceFunction`] for names not in the
    /// registry; an index descriptor with such a name does not open.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "euclidean" => Ok(Self::Euclidean),
            "cosine" => Ok(Self::Cosine),
            "inner_product" => Ok(Self::InnerProduct),
            other => Err(Error::UnknownDistanceFunction(other.to_string())),
        }
    }

    /// Returns the comparator this metric pairs with.
    #[must_use]
    pub const fn default_comparator(&self) -> DistanceComparator {
        match self {
            Self::Euclidean | Self::Cosine => DistanceComparator::Natural,
            Self::InnerProduct => DistanceComparator::Reversed,
        }
    }

    fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
        let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
        let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

        if norm_a == 0.0 || norm_b == 0.0 {
            return 0.0;
        }

        dot / (norm_a * norm_b)
    }

    fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
        a.iter()
            .zip(b.iter())
            .map(|(x, y)| (x - y).powi(2))
            .sum::<f32>()
            .sqrt()
    }

    fn dot_product(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
    }
}

/// Total order over distances, extended with a "worst possible" sentinel.
///
/// The sentinel stands in for the absent lower bound at the start of a
/// search; it is never materialized as a distance of an actual candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceComparator {
    /// Smaller distance is closer (Euclidean, cosine distance).
    #[default]
    Natural,
    /// Larger value is closer (raw similarity scores, inner product).
    Reversed,
}

impl DistanceComparator {
    /// Returns the registry name of this comparator.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Natural => "natural",
            Self::Reversed => "reversed",
        }
    }

    /// Resolves a comparator from its registry name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownComparator`] for names not in the registry.
    pub fn from_name(name: &str) -> Result<Self> {
        match name {
            "natural" => Ok(Self::Natural),
            "reversed" => Ok(Self::Reversed),
            other => Err(Error::UnknownComparator(other.to_string())),
        }
    }

    /// Compares two distances; `Ordering::Less` means `a` is closer.
    #[must_use]
    pub fn cmp(&self, a: f32, b: f32) -> Ordering {
        match self {
            Self::Natural => a.total_cmp(&b),
            Self::Reversed => b.total_cmp(&a),
        }
    }

    /// Returns true if `a` is strictly closer than `b`.
    #[must_use]
    pub fn lt(&self, a: f32, b: f32) -> bool {
        self.cmp(a, b) == Ordering::Less
    }

    /// Returns true if `a` is strictly farther than `b`.
    #[must_use]
    pub fn gt(&self, a: f32, b: f32) -> bool {
        self.cmp(a, b) == Ordering::Greater
    }

    /// The sentinel bound: farther than every representable distance.
    #[must_use]
    pub const fn worst(&self) -> f32 {
        match self {
            Self::Natural => f32::INFINITY,
            Self::Reversed => f32::NEG_INFINITY,
        }
    }

    /// Maps a distance into a monotone sort key (smaller key = closer).
    ///
    /// Factoring the order into key space once lets every heap in the index
    /// compare plain keys regardless of the comparator direction. The
    /// mapping is an involution: applying it to a key recovers the raw
    /// distance.
    #[must_use]
    pub fn sort_key(&self, d: f32) -> f32 {
        match self {
            Self::Natural => d,
            Self::Reversed => -d,
        }
    }
}
