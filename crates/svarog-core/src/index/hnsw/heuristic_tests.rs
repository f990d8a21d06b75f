//! Tests for the `heuristic` module

use super::heuristic::select_diverse;
use crate::distance::{DistanceComparator, DistanceMetric};

/// Pairwise distances computed over a fixed 2-d point set, keyed by index.
fn pair(points: &'static [[f32; 2]]) -> impl FnMut(usize, usize) -> crate::Result<f32> {
    move |a, b| Ok(DistanceMetric::Euclidean.calculate(&points[a], &points[b]))
}

#[test]
fn test_small_candidate_set_passes_through() {
    let candidates = vec![(0_usize, 1.0), (1, 2.0)];
    let kept = select_diverse(candidates.clone(), 3, DistanceComparator::Natural, |_, _| {
        panic!("pair distance must not be consulted below the bound")
    })
    .unwrap();
    assert_eq!(kept, candidates);
}

#[test]
fn test_clustered_candidates_are_pruned() {
    // Query at the origin. Points 0 and 1 are a tight pair to the east;
    // point 2 is alone to the north. Keeping 0 shadows 1.
    static POINTS: [[f32; 2]; 3] = [[1.0, 0.0], [1.2, 0.0], [0.0, 1.5]];
    let candidates = vec![(0_usize, 1.0), (1, 1.2), (2, 1.5)];

    let kept = select_diverse(candidates, 2, DistanceComparator::Natural, pair(&POINTS)).unwrap();
    let ids: Vec<usize> = kept.iter().map(|&(id, _)| id).collect();
    assert_eq!(ids, vec![0, 2]);
}

#[test]
fn test_bound_is_respected() {
    // Four mutually distant points; diversification keeps the closest m.
    static POINTS: [[f32; 2]; 4] = [[10.0, 0.0], [0.0, 10.0], [-10.0, 0.0], [0.0, -10.0]];
    let candidates = vec![(0_usize, 1.0), (1, 2.0), (2, 3.0), (3, 4.0)];

    let kept = select_diverse(candidates, 2, DistanceComparator::Natural, pair(&POINTS)).unwrap();
    assert_eq!(kept.len(), 2);
    assert_eq!(kept[0].0, 0);
    assert_eq!(kept[1].0, 1);
}

#[test]
fn test_rejected_candidates_are_not_backfilled() {
    // 1 and 2 both hide behind 0; only 0 survives even though m = 2.
    static POINTS: [[f32; 2]; 3] = [[1.0, 0.0], [1.1, 0.0], [1.2, 0.0]];
    let candidates = vec![(0_usize, 1.0), (1, 1.1), (2, 1.2)];

    let kept = select_diverse(candidates, 2, DistanceComparator::Natural, pair(&POINTS)).unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].0, 0);
}

#[test]
fn test_equal_pair_distance_keeps_candidate() {
    // A kept neighbor exactly as close as the query does not reject.
    let candidates = vec![(0_usize, 1.0), (1, 1.0), (2, 1.0)];
    let kept = select_diverse(candidates, 3, DistanceComparator::Natural, |_, _| Ok(1.0)).unwrap();
    assert_eq!(kept.len(), 3);
}

#[test]
fn test_reversed_comparator() {
    // Under the reversed order, larger values are closer; a pair distance
    // larger than the query similarity means "too close to a kept one".
    let candidates = vec![(0_usize, 0.9), (1, 0.8)];
    let kept = select_diverse(candidates, 2, DistanceComparator::Reversed, |_, _| Ok(0.95)).unwrap();
    assert_eq!(kept.len(), 1);
}
