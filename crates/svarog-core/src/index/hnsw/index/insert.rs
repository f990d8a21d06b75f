//! Concurrent vertex registration.
//!
//! `add` runs the layered insertion under a three-part protocol: the
//! index-wide insert lock covers level assignment, the idempotence gate and
//! entry-point promotion; per-vertex locks cover neighbor-list reads during
//! descent and neighborhood rewrites; the excluded set keeps other
//! inserters from linking to this vertex while its layers are still being
//! built. The insert lock is dropped early when the new vertex cannot
//! become the entry point, so inserts at or below the current top layer
//! proceed in parallel.

use super::HnswIndex;
use crate::error::{Error, Result};
use crate::graph::VertexId;
use crate::index::hnsw::heuristic::select_diverse;

impl HnswIndex {
    /// Creates a vertex for `(external_id, vector)` and registers it.
    ///
    /// # Errors
    ///
    /// Fails fast on dimension mismatch (nothing is created), on a
    /// duplicate external id, or on storage errors.
    pub fn insert(&self, external_id: &str, vector: Vec<f32>) -> Result<VertexId> {
        if vector.len() != self.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: vector.len(),
            });
        }
        let vertex = self.adapter().create_vertex(external_id, vector)?;
        self.add(vertex)?;
        Ok(vertex)
    }

    /// Registers an existing vertex in the index.
    ///
    /// Registration is idempotent: a vertex that already has base-layer
    /// out-edges is reported as inserted without any mutation.
    ///
    /// # Errors
    ///
    /// Fails on dimension mismatch or storage errors. After a storage
    /// failure mid-insert the committed prefix keeps the degree bounds, so
    /// the index stays searchable; recall for the partially-wired vertex
    /// may degrade until a retry.
    pub fn add(&self, vertex: VertexId) -> Result<bool> {
        let record = self.adapter().read_vector(vertex)?;
        let vector = record
            .vector()
            .ok_or_else(|| Error::Storage(format!("vertex {vertex} has no vector")))?;
        if vector.len() != self.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: self.dimensions(),
                actual: vector.len(),
            });
        }

        let external_id = self.adapter().read_external_id(vertex)?;
        let random_level = self.assigner().assign(&external_id);

        let mut global = Some(self.global().lock());

        if self.adapter().out_degree(vertex, 0)? > 0 {
            return Ok(true);
        }
        self.adapter().write_max_level(vertex, random_level)?;
        let excluded_guard = self.excluded().register(vertex);

        let entry = self.entry_point();
        let entry_level = match entry {
            Some(ep) => self.adapter().read_max_level(ep)?,
            None => 0,
        };

        // Early release: at or below the current top layer this insert
        // cannot promote the entry point, so other inserters may proceed.
        if entry.is_some() && random_level <= entry_level {
            global = None;
        }

        if let Some(ep) = entry {
            let mut cur = ep;
            if random_level < entry_level {
                let entry_dist = self.distance_to(vector, ep)?;
                (cur, _) = self.greedy_descent(vector, ep, entry_dist, random_level + 1, true)?;
            }

            for level in (0..=random_level.min(entry_level)).rev() {
                cur = self.wire_level(vertex, vector, cur, level)?;
            }
        }

        if entry.is_none() || random_level > entry_level {
            // The early-release rule kept the insert lock in exactly these
            // cases.
            debug_assert!(global.is_some());
            self.set_entry_point(Some(vertex));
            tracing::debug!(vertex, level = random_level, "entry point promoted");
        }

        drop(excluded_guard);
        drop(global);
        Ok(true)
    }

    /// Wires one layer: searches the layer from `cur`, selects diverse
    /// neighbors, links both directions with degree capping. Returns the
    /// entry vertex for the next layer down.
    fn wire_level(
        &self,
        vertex: VertexId,
        vector: &[f32],
        cur: VertexId,
        level: usize,
    ) -> Result<VertexId> {
        let found = self.search_base_layer(cur, vector, self.ef_construction(), level)?;
        let next = found.first().map_or(cur, |&(c, _)| c);

        let selected = select_diverse(found, self.m(), self.comparator(), |a, b| {
            self.distance_between(a, b)
        })?;

        self.adapter().ensure_edge_type(level);
        for (neighbor, _) in selected {
            // Half-built vertices of other inserters are skipped; their own
            // wiring will find this vertex once both are reachable.
            if neighbor == vertex || self.excluded().contains(neighbor) {
                continue;
            }
            self.adapter().add_edge(vertex, neighbor, level)?;
            self.link_back(neighbor, vertex, level)?;
        }

        Ok(next)
    }

    /// Adds the back-edge `neighbor -> vertex` if the neighbor has spare
    /// degree, otherwise re-prunes the neighbor's whole neighborhood
    /// through the diversification heuristic. Runs under the neighbor's
    /// mutation lock so its out-degree never overshoots the cap.
    fn link_back(&self, neighbor: VertexId, vertex: VertexId, level: usize) -> Result<()> {
        let cap = self.params().degree_cap(level);
        let _vertex_lock = self.vertex_locks().lock(neighbor);

        let degree = self.adapter().out_degree(neighbor, level)?;
        if degree < cap {
            return self.adapter().add_edge(neighbor, vertex, level);
        }

        let mut candidates: Vec<(VertexId, f32)> = Vec::with_capacity(degree + 1);
        candidates.push((vertex, self.distance_between(neighbor, vertex)?));
        for existing in self.adapter().out_neighbors(neighbor, level)? {
            candidates.push((existing, self.distance_between(neighbor, existing)?));
        }
        candidates.sort_by(|a, b| self.comparator().cmp(a.1, b.1));

        let kept = select_diverse(candidates, cap, self.comparator(), |a, b| {
            self.distance_between(a, b)
        })?;
        let targets: Vec<VertexId> = kept.into_iter().map(|(id, _)| id).collect();
        self.adapter().replace_out_edges(neighbor, level, &targets)?;
        tracing::debug!(
            neighbor,
            level,
            degree = targets.len(),
            "neighborhood re-pruned"
        );
        Ok(())
    }
}
