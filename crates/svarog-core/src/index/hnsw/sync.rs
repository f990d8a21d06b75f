//! Concurrency primitives for parallel inserts.
//!
//! Three resources coordinate concurrent `add` calls:
//! - the index-wide insert mutex (owned by the index itself),
//! - per-vertex mutation locks, interned in a striped registry here,
//! - the process-wide excluded-candidate set of vertices whose
//!   neighborhoods are still being built.
//!
//! Lock order is global → vertex → excluded set; the excluded set is only
//! ever held for a membership operation and never across another
//! acquisition.

use crate::graph::VertexId;
use dashmap::DashSet;
use parking_lot::{Mutex, MutexGuard};

/// Number of lock stripes. Vertices hash onto stripes, so two vertices may
/// share a lock; that only over-serializes, never under-locks.
const LOCK_STRIPES: usize = 128;

/// Striped registry of per-vertex mutation locks.
///
/// A vertex's lock is held while scanning its out-neighbor list during
/// insert descent and while rewriting its neighborhood, so observers see a
/// consistent snapshot and the degree caps hold at every point. Locking the
/// storage engine's own vertex objects is deliberately not relied upon.
pub(crate) struct VertexLocks {
    stripes: Vec<Mutex<()>>,
}

impl VertexLocks {
    pub(crate) fn new() -> Self {
        Self {
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    /// Acquires the mutation lock for a vertex.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn lock(&self, v: VertexId) -> MutexGuard<'_, ()> {
        self.stripes[(v as usize) % LOCK_STRIPES].lock()
    }
}

/// Process-wide set of vertices currently being inserted.
///
/// Concurrent inserters skip excluded vertices when selecting neighbors:
/// linking to a half-built neighborhood would wire the graph through a
/// vertex whose upper layers do not exist yet.
pub(crate) struct ExcludedSet {
    inner: DashSet<VertexId>,
}

impl ExcludedSet {
    pub(crate) fn new() -> Self {
        Self {
            inner: DashSet::new(),
        }
    }

    /// Registers a vertex and returns a guard that deregisters it on drop,
    /// so the set stays clean on every exit path, including errors.
    pub(crate) fn register(&self, v: VertexId) -> ExcludedGuard<'_> {
        self.inner.insert(v);
        ExcludedGuard { set: self, vertex: v }
    }

    /// Membership check; brief, called once per selected neighbor.
    pub(crate) fn contains(&self, v: VertexId) -> bool {
        self.inner.contains(&v)
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.inner.len()
    }
}

/// RAII registration in the excluded set.
pub(crate) struct ExcludedGuard<'a> {
    set: &'a ExcludedSet,
    vertex: VertexId,
}

impl Drop for ExcludedGuard<'_> {
    fn drop(&mut self) {
        self.set.inner.remove(&self.vertex);
    }
}
