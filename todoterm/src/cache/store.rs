//! The query cache: snapshots keyed by query identity, with optimistic
//! mutation dispatch and commit/rollback resolution.

use std::collections::{HashMap, HashSet};

use parking_lot::RwLock;

use super::snapshot::{Snapshot, TodolistPatch};
use super::QueryKey;

/// A dispatched-but-unresolved optimistic mutation.
///
/// Created by [`QueryCache::apply_optimistic`] and resolved exactly once by
/// passing it to [`QueryCache::commit`] or [`QueryCache::rollback`] — both
/// consume the guard, so a mutation cannot be resolved twice.
#[derive(Debug)]
#[must_use = "an optimistic mutation must be resolved via commit or rollback"]
pub struct PendingMutation {
    key: QueryKey,
    inverse: TodolistPatch,
}

impl PendingMutation {
    /// The query key this mutation was applied to.
    #[must_use]
    pub fn key(&self) -> &QueryKey {
        &self.key
    }

    /// The inverse patch that undoes the optimistic edit.
    #[must_use]
    pub fn inverse(&self) -> &TodolistPatch {
        &self.inverse
    }
}

/// Holds query results keyed by query identity.
///
/// The cache exclusively owns all snapshots; every change flows through
/// patch application under the write lock, so a concurrent reader never
/// observes a half-applied patch. One optimistic mutation per key may be in
/// flight at a time (mutations on the same key are processed FIFO); a
/// violation is logged, not merged.
#[derive(Debug, Default)]
pub struct QueryCache {
    inner: RwLock<CacheInner>,
}

#[derive(Debug, Default)]
struct CacheInner {
    snapshots: HashMap<QueryKey, Snapshot>,
    in_flight: HashSet<QueryKey>,
}

impl QueryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a cloned view of the current snapshot for `key`.
    ///
    /// Returns an empty snapshot for a key that has never been populated.
    #[must_use]
    pub fn snapshot(&self, key: &QueryKey) -> Snapshot {
        self.inner
            .read()
            .snapshots
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Replaces the snapshot for `key` wholesale (used by fetches).
    pub fn replace(&self, key: &QueryKey, snapshot: Snapshot) {
        let mut inner = self.inner.write();
        inner.snapshots.insert(key.clone(), snapshot);
    }

    /// Applies a patch whose result is immediately final (no remote call to
    /// wait for); the inverse is discarded.
    pub fn apply(&self, key: &QueryKey, patch: &TodolistPatch) {
        let mut inner = self.inner.write();
        let snapshot = inner.snapshots.entry(key.clone()).or_default();
        let _ = patch.apply(snapshot);
    }

    /// Applies a patch speculatively and records its inverse.
    ///
    /// The new snapshot is computed and stored atomically with respect to
    /// concurrent reads of the same key. The returned [`PendingMutation`]
    /// must be resolved exactly once via [`commit`](Self::commit) or
    /// [`rollback`](Self::rollback).
    pub fn apply_optimistic(&self, key: &QueryKey, patch: &TodolistPatch) -> PendingMutation {
        let mut inner = self.inner.write();
        if !inner.in_flight.insert(key.clone()) {
            // Out-of-order overlapping patches on one key are outside the
            // model; mutations per key are expected to be FIFO.
            tracing::warn!(%key, "overlapping optimistic mutation on one key");
        }
        let snapshot = inner.snapshots.entry(key.clone()).or_default();
        let inverse = patch.apply(snapshot);
        tracing::debug!(%key, ?patch, "applied optimistic patch");
        PendingMutation {
            key: key.clone(),
            inverse,
        }
    }

    /// Resolves a mutation as successful: the optimistic value becomes
    /// final and the stored inverse is discarded. No-op on the snapshot.
    pub fn commit(&self, pending: PendingMutation) {
        let mut inner = self.inner.write();
        inner.in_flight.remove(&pending.key);
        tracing::debug!(key = %pending.key, "committed optimistic mutation");
    }

    /// Resolves a mutation as failed: applies the recorded inverse,
    /// restoring the pre-mutation snapshot.
    pub fn rollback(&self, pending: PendingMutation) {
        let mut inner = self.inner.write();
        let snapshot = inner.snapshots.entry(pending.key.clone()).or_default();
        let _ = pending.inverse.apply(snapshot);
        inner.in_flight.remove(&pending.key);
        tracing::debug!(key = %pending.key, "rolled back optimistic mutation");
    }
}
