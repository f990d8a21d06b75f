//! Ordered float wrapper for use in `BinaryHeap`.
//!
//! Provides IEEE 754 total ordering for f32 sort keys, including proper NaN
//! handling. Uses `f32::total_cmp` which defines:
//! -NaN < -∞ < ... < -0 < +0 < ... < +∞ < +NaN

use std::cmp::Ordering;

/// Wrapper for f32 sort keys to implement `Ord` for `BinaryHeap`.
///
/// Heap entries are `(OrderedFloat, id)` pairs: distance ties break by id,
/// matching the insertion order of the graph. Keys come out of
/// [`DistanceComparator::sort_key`](crate::distance::DistanceComparator::sort_key),
/// so a smaller key always means a closer candidate regardless of the
/// comparator direction.
#[derive(Debug, Clone, Copy)]
pub struct OrderedFloat(pub f32);

impl PartialEq for OrderedFloat {
    fn eq(&self, other: &Self) -> bool {
        // Bit comparison for consistency with total_cmp: NaN == NaN (same
        // bits) and -0.0 != +0.0.
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for OrderedFloat {}

impl PartialOrd for OrderedFloat {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrderedFloat {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}
