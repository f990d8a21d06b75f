//! Search over the persistent graph.
//!
//! A query descends greedily from the entry point through the upper layers,
//! then runs a best-first expansion of the base layer bounded by `ef`. Two
//! heaps drive the expansion: a min-heap of candidates to visit and a
//! max-heap of the best results found so far, capped at `ef`. All ordering
//! happens in comparator key space, where a smaller key is always closer
//! and `+∞` is the absent bound.

use super::HnswIndex;
use crate::error::{Error, Result};
use crate::graph::VertexId;
use crate::index::hnsw::ordered::OrderedFloat;
use rustc_hash::FxHashSet;
use std::cmp::Reverse;
use std::collections::BinaryHeap;

impl HnswIndex {
    /// Finds the `k` nearest vertices to a query vector, ascending by
    /// distance.
    ///
    /// # Errors
    ///
    /// Fails on dimension mismatch or storage errors.
    pub fn find_nearest(&self, query: &[f32], k: usize) -> Result<Vec<(VertexId, f32)>> {
        if query.len() != self.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: query.len(),
            });
        }
        let Some(entry) = self.entry_point() else {
            return Ok(Vec::new());
        };

        let entry_dist = self.distance_to(query, entry)?;
        let (cur, _) = self.greedy_descent(query, entry, entry_dist, 1, false)?;

        let mut found = self.search_base_layer(cur, query, self.ef().max(k), 0)?;
        found.truncate(k);
        Ok(found)
    }

    /// Finds the `k` nearest vertices to the vertex registered under an
    /// external id, excluding that vertex itself.
    ///
    /// # Errors
    ///
    /// Fails when the id is unknown, plus anything `find_nearest` fails on.
    pub fn find_neighbors(&self, external_id: &str, k: usize) -> Result<Vec<(VertexId, f32)>> {
        let vertex = self
            .resolve(external_id)?
            .ok_or_else(|| Error::VertexNotFound(external_id.to_string()))?;
        let record = self.adapter().read_vector(vertex)?;
        let query = record
            .vector()
            .ok_or_else(|| Error::Storage(format!("vertex {vertex} has no vector")))?;

        let mut found = self.find_nearest(query, k + 1)?;
        found.retain(|&(v, _)| v != vertex);
        found.truncate(k);
        Ok(found)
    }

    /// Greedy descent from `start` at the entry point's top layer down to
    /// `to_level` inclusive: at each layer, move to the closest out-neighbor
    /// until none improves.
    ///
    /// With `locked`, each vertex's neighbor list is read under that
    /// vertex's mutation lock, so inserters observe consistent snapshots
    /// while descending past in-flight rewires.
    pub(super) fn greedy_descent(
        &self,
        query: &[f32],
        start: VertexId,
        start_dist: f32,
        to_level: usize,
        locked: bool,
    ) -> Result<(VertexId, f32)> {
        let mut cur = start;
        let mut cur_dist = start_dist;
        let from_level = self.adapter().read_max_level(start)?;

        for level in (to_level..=from_level).rev() {
            loop {
                let neighbors = if locked {
                    let _vertex = self.vertex_locks().lock(cur);
                    self.adapter().out_neighbors(cur, level)?
                } else {
                    self.adapter().out_neighbors(cur, level)?
                };

                let mut improved = false;
                for neighbor in neighbors {
                    let dist = self.distance_to(query, neighbor)?;
                    if self.comparator().lt(dist, cur_dist) {
                        cur = neighbor;
                        cur_dist = dist;
                        improved = true;
                    }
                }
                if !improved {
                    break;
                }
            }
        }

        Ok((cur, cur_dist))
    }

    /// Best-first expansion of one layer from `entry`, returning up to `k`
    /// vertices ascending by distance.
    ///
    /// Terminates as soon as the closest unexpanded candidate is farther
    /// than the worst retained result while the result heap is full: the
    /// candidate heap is a min-heap, so nothing behind it can improve the
    /// results either.
    pub(super) fn search_base_layer(
        &self,
        entry: VertexId,
        query: &[f32],
        k: usize,
        level: usize,
    ) -> Result<Vec<(VertexId, f32)>> {
        let mut visited: FxHashSet<VertexId> = FxHashSet::default();
        let mut candidates: BinaryHeap<Reverse<(OrderedFloat, VertexId)>> = BinaryHeap::new();
        let mut top: BinaryHeap<(OrderedFloat, VertexId)> = BinaryHeap::new();

        let entry_key = self.comparator().sort_key(self.distance_to(query, entry)?);
        candidates.push(Reverse((OrderedFloat(entry_key), entry)));
        top.push((OrderedFloat(entry_key), entry));
        visited.insert(entry);

        while let Some(Reverse((OrderedFloat(key), vertex))) = candidates.pop() {
            let lower_bound = top.peek().map_or(f32::INFINITY, |&(OrderedFloat(b), _)| b);
            if key > lower_bound && top.len() >= k {
                break;
            }

            for neighbor in self.adapter().out_neighbors(vertex, level)? {
                if visited.insert(neighbor) {
                    let n_key = self.comparator().sort_key(self.distance_to(query, neighbor)?);
                    let lower_bound =
                        top.peek().map_or(f32::INFINITY, |&(OrderedFloat(b), _)| b);

                    if top.len() < k || n_key < lower_bound {
                        candidates.push(Reverse((OrderedFloat(n_key), neighbor)));
                        top.push((OrderedFloat(n_key), neighbor));
                        if top.len() > k {
                            top.pop();
                        }
                    }
                }
            }
        }

        let mut result: Vec<(VertexId, f32)> = top
            .into_iter()
            .map(|(OrderedFloat(key), vertex)| (vertex, self.comparator().sort_key(key)))
            .collect();
        result.sort_by(|a, b| self.comparator().cmp(a.1, b.1).then(a.0.cmp(&b.0)));
        Ok(result)
    }
}
