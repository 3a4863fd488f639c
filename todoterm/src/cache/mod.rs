//! Optimistic mutation cache for query results.
//!
//! The cache owns every [`Snapshot`](snapshot::Snapshot) exclusively; all
//! changes flow through reversible [`TodolistPatch`] application. A mutation
//! is applied locally the moment it is dispatched and either committed when
//! the remote call succeeds or rolled back when it fails.

pub mod snapshot;
pub mod store;

pub use snapshot::{Snapshot, TodolistPatch};
pub use store::{PendingMutation, QueryCache};

/// Identifies a cached collection.
///
/// Opaque, stable, and comparable for equality; the cache keys its
/// snapshots by it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey(String);

impl QueryKey {
    /// Creates a key from its string representation.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The key under which the todolist collection is cached.
    #[must_use]
    pub fn todolists() -> Self {
        Self::new("todolists")
    }

    /// Returns the string representation of this key.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for QueryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
