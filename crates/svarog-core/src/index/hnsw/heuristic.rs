//! Neighbor selection by diversification.
//!
//! Given candidates ordered by distance to the query, keep a candidate only
//! if no already-kept neighbor is strictly closer to it than the query is.
//! The kept set then spans "new directions" around the query, which is what
//! preserves long-range navigability at bounded out-degree. Rejected
//! candidates are dropped, not backfilled.

use crate::distance::DistanceComparator;
use crate::error::Result;

/// Prunes `candidates` down to at most `m` diverse entries.
///
/// `candidates` must be sorted closest-first; the result preserves that
/// order. A candidate set smaller than `m` is returned unchanged.
/// `pair_distance` computes the distance between two candidates by id and
/// may touch storage, hence the fallible signature.
pub(crate) fn select_diverse<I, F>(
    candidates: Vec<(I, f32)>,
    m: usize,
    comparator: DistanceComparator,
    mut pair_distance: F,
) -> Result<Vec<(I, f32)>>
where
    I: Copy,
    F: FnMut(I, I) -> Result<f32>,
{
    if candidates.len() < m {
        return Ok(candidates);
    }

    let mut kept: Vec<(I, f32)> = Vec::with_capacity(m);
    for (candidate, query_dist) in candidates {
        if kept.len() >= m {
            break;
        }

        let mut diverse = true;
        for &(neighbor, _) in &kept {
            if comparator.lt(pair_distance(neighbor, candidate)?, query_dist) {
                diverse = false;
                break;
            }
        }

        if diverse {
            kept.push((candidate, query_dist));
        }
    }

    Ok(kept)
}
