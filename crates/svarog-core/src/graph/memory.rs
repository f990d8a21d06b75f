//! In-memory reference implementation of the storage contract.
//!
//! `MemoryGraph` is a thread-safe property graph using sharded locking to
//! reduce contention: vertices are distributed across shards by identity,
//! and every operation holds at most ONE shard lock at a time (multi-vertex
//! operations run as a sequence of single-shard phases). Cross-shard
//! consistency between out-lists and in-lists is therefore eventual within
//! an operation; `delete_vertex` must not race a concurrent edge rewrite on
//! the same vertex.

use crate::error::{Error, Result};
use crate::graph::store::GraphStore;
use crate::graph::{VertexId, VertexRecord};
use dashmap::DashMap;
use indexmap::IndexSet;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Default number of vertex shards.
///
/// 64 shards keeps per-shard populations small for graphs in the
/// hundred-thousand range without paying lock overhead on tiny graphs.
const DEFAULT_NUM_SHARDS: usize = 64;

/// One vertex plus its adjacency, keyed by edge type.
#[derive(Debug)]
struct VertexSlot {
    record: VertexRecord,
    /// Outgoing edges: edge_type -> targets, in insertion order.
    out: HashMap<String, Vec<VertexId>>,
    /// Incoming edges: edge_type -> sources. Maintained so vertex deletion
    /// can drop incident edges in both directions.
    incoming: HashMap<String, Vec<VertexId>>,
}

/// Sharded in-memory property graph.
pub struct MemoryGraph {
    shards: Vec<RwLock<FxHashMap<VertexId, VertexSlot>>>,
    num_shards: usize,
    next_id: AtomicU64,
    /// Unique secondary indexes: (vertex_type, property) -> key -> vertex.
    unique: DashMap<(String, String), DashMap<String, VertexId>>,
    /// Registered edge types, in creation order.
    edge_types: RwLock<IndexSet<String>>,
    /// Open transaction depth; batch boundaries only, writes are immediate.
    tx_depth: AtomicUsize,
}

impl Default for MemoryGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryGraph {
    /// Creates a new empty graph with the default shard count.
    #[must_use]
    pub fn new() -> Self {
        Self::with_shards(DEFAULT_NUM_SHARDS)
    }

    /// Creates a new empty graph with a specific shard count.
    ///
    /// # Panics
    ///
    /// Panics if `num_shards` is 0.
    #[must_use]
    pub fn with_shards(num_shards: usize) -> Self {
        assert!(num_shards > 0, "num_shards must be at least 1");
        let shards = (0..num_shards)
            .map(|_| RwLock::new(FxHashMap::default()))
            .collect();
        Self {
            shards,
            num_shards,
            next_id: AtomicU64::new(1),
            unique: DashMap::new(),
            edge_types: RwLock::new(IndexSet::new()),
            tx_depth: AtomicUsize::new(0),
        }
    }

    /// Returns the registered edge types in creation order.
    #[must_use]
    pub fn edge_types(&self) -> Vec<String> {
        self.edge_types.read().iter().cloned().collect()
    }

    #[allow(clippy::cast_possible_truncation)]
    fn shard(&self, v: VertexId) -> &RwLock<FxHashMap<VertexId, VertexSlot>> {
        &self.shards[(v as usize) % self.num_shards]
    }

    /// Canonical index key for a property value: strings index by content,
    /// everything else by its JSON rendering.
    fn index_key(value: &Value) -> String {
        match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }

    fn with_slot<T>(
        &self,
        v: VertexId,
        f: impl FnOnce(&VertexSlot) -> T,
    ) -> Result<T> {
        let shard = self.shard(v).read();
        shard
            .get(&v)
            .map(f)
            .ok_or_else(|| Error::VertexNotFound(v.to_string()))
    }

    fn with_slot_mut<T>(
        &self,
        v: VertexId,
        f: impl FnOnce(&mut VertexSlot) -> T,
    ) -> Result<T> {
        let mut shard = self.shard(v).write();
        shard
            .get_mut(&v)
            .map(f)
            .ok_or_else(|| Error::VertexNotFound(v.to_string()))
    }

    fn contains(&self, v: VertexId) -> bool {
        self.shard(v).read().contains_key(&v)
    }

    /// Removes `item` from the `edge_type` list selected by `pick` on the
    /// given vertex, ignoring missing vertices (concurrent deletion).
    fn unlink(&self, v: VertexId, edge_type: &str, item: VertexId, incoming: bool) {
        let mut shard = self.shard(v).write();
        if let Some(slot) = shard.get_mut(&v) {
            let lists = if incoming { &mut slot.incoming } else { &mut slot.out };
            if let Some(list) = lists.get_mut(edge_type) {
                if let Some(pos) = list.iter().position(|&x| x == item) {
                    list.remove(pos);
                }
            }
        }
    }
}

impl GraphStore for MemoryGraph {
    fn create_vertex(&self, record: VertexRecord) -> Result<VertexId> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        // Claim unique-index entries before the vertex becomes visible; a
        // conflicting key releases everything claimed so far.
        let mut claimed: Vec<((String, String), String)> = Vec::new();
        for entry in &self.unique {
            let (vertex_type, property) = entry.key();
            if vertex_type != record.label() {
                continue;
            }
            if let Some(value) = record.property(property) {
                let key = Self::index_key(value);
                let index = entry.value();
                match index.entry(key.clone()) {
                    dashmap::mapref::entry::Entry::Occupied(_) => {
                        for (index_id, k) in claimed {
                            if let Some(idx) = self.unique.get(&index_id) {
                                idx.remove(&k);
                            }
                        }
                        return Err(Error::UniqueViolation(key));
                    }
                    dashmap::mapref::entry::Entry::Vacant(slot) => {
                        slot.insert(id);
                        claimed.push((entry.key().clone(), key));
                    }
                }
            }
        }

        let slot = VertexSlot {
            record,
            out: HashMap::new(),
            incoming: HashMap::new(),
        };
        self.shard(id).write().insert(id, slot);
        Ok(id)
    }

    fn load_vertex(&self, v: VertexId) -> Result<VertexRecord> {
        self.with_slot(v, |slot| slot.record.clone())
    }

    fn vertex_property(&self, v: VertexId, name: &str) -> Result<Option<Value>> {
        self.with_slot(v, |slot| slot.record.property(name).cloned())
    }

    fn set_vertex_property(&self, v: VertexId, name: &str, value: Value) -> Result<()> {
        self.with_slot_mut(v, |slot| slot.record.set_property(name, value))
    }

    fn vertex_vector(&self, v: VertexId) -> Result<Vec<f32>> {
        self.with_slot(v, |slot| slot.record.vector().map(<[f32]>::to_vec))?
            .ok_or_else(|| Error::Storage(format!("vertex {v} has no vector")))
    }

    fn ensure_unique_index(&self, vertex_type: &str, property: &str) -> Result<()> {
        let key = (vertex_type.to_string(), property.to_string());
        if let dashmap::mapref::entry::Entry::Vacant(slot) = self.unique.entry(key) {
            let index = DashMap::new();
            // Backfill from existing vertices; duplicates fail index creation.
            for shard in &self.shards {
                for (id, vertex) in shard.read().iter() {
                    if vertex.record.label() != vertex_type {
                        continue;
                    }
                    if let Some(value) = vertex.record.property(property) {
                        let k = Self::index_key(value);
                        if index.insert(k.clone(), *id).is_some() {
                            return Err(Error::UniqueViolation(k));
                        }
                    }
                }
            }
            slot.insert(index);
        }
        Ok(())
    }

    fn lookup_unique(
        &self,
        vertex_type: &str,
        property: &str,
        key: &str,
    ) -> Result<Option<VertexId>> {
        let index_id = (vertex_type.to_string(), property.to_string());
        let index = self.unique.get(&index_id).ok_or_else(|| {
            Error::Storage(format!("no unique index on {vertex_type}.{property}"))
        })?;
        Ok(index.get(key).map(|entry| *entry.value()))
    }

    fn ensure_edge_type(&self, name: &str) {
        let mut types = self.edge_types.write();
        types.insert(name.to_string());
    }

    fn edge_type_exists(&self, name: &str) -> bool {
        self.edge_types.read().contains(name)
    }

    fn out_neighbors(&self, v: VertexId, edge_type: &str) -> Result<Vec<VertexId>> {
        self.with_slot(v, |slot| {
            slot.out.get(edge_type).cloned().unwrap_or_default()
        })
    }

    fn out_degree(&self, v: VertexId, edge_type: &str) -> Result<usize> {
        self.with_slot(v, |slot| {
            slot.out.get(edge_type).map_or(0, Vec::len)
        })
    }

    fn add_edge(&self, from: VertexId, to: VertexId, edge_type: &str) -> Result<()> {
        if !self.contains(to) {
            return Err(Error::VertexNotFound(to.to_string()));
        }
        self.with_slot_mut(from, |slot| {
            slot.out.entry(edge_type.to_string()).or_default().push(to);
        })?;
        self.with_slot_mut(to, |slot| {
            slot.incoming
                .entry(edge_type.to_string())
                .or_default()
                .push(from);
        })
    }

    fn replace_out_edges(&self, v: VertexId, edge_type: &str, targets: &[VertexId]) -> Result<()> {
        let old = self.with_slot_mut(v, |slot| {
            slot.out
                .insert(edge_type.to_string(), targets.to_vec())
                .unwrap_or_default()
        })?;

        for &t in &old {
            if !targets.contains(&t) {
                self.unlink(t, edge_type, v, true);
            }
        }
        for &t in targets {
            if !old.contains(&t) {
                self.with_slot_mut(t, |slot| {
                    slot.incoming
                        .entry(edge_type.to_string())
                        .or_default()
                        .push(v);
                })?;
            }
        }
        Ok(())
    }

    fn delete_vertex(&self, v: VertexId) -> Result<bool> {
        let Some(slot) = self.shard(v).write().remove(&v) else {
            return Ok(false);
        };

        for entry in &self.unique {
            let (vertex_type, property) = entry.key();
            if vertex_type != slot.record.label() {
                continue;
            }
            if let Some(value) = slot.record.property(property) {
                entry.value().remove(&Self::index_key(value));
            }
        }

        for (edge_type, targets) in &slot.out {
            for &t in targets {
                self.unlink(t, edge_type, v, true);
            }
        }
        for (edge_type, sources) in &slot.incoming {
            for &s in sources {
                self.unlink(s, edge_type, v, false);
            }
        }

        Ok(true)
    }

    fn vertex_count(&self) -> usize {
        self.shards.iter().map(|s| s.read().len()).sum()
    }

    fn vertex_ids(&self) -> Vec<VertexId> {
        let mut ids: Vec<VertexId> = self
            .shards
            .iter()
            .flat_map(|s| s.read().keys().copied().collect::<Vec<_>>())
            .collect();
        ids.sort_unstable();
        ids
    }

    fn begin(&self) -> Result<()> {
        let depth = self.tx_depth.fetch_add(1, Ordering::AcqRel);
        tracing::trace!(depth = depth + 1, "transaction batch opened");
        Ok(())
    }

    fn commit(&self) -> Result<()> {
        let depth = self.tx_depth.load(Ordering::Acquire);
        if depth == 0 {
            return Err(Error::Storage("commit without open transaction".to_string()));
        }
        self.tx_depth.fetch_sub(1, Ordering::AcqRel);
        tracing::trace!(depth = depth - 1, "transaction batch committed");
        Ok(())
    }
}
