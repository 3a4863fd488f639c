//! In-memory todolist collection.

use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use todoterm_proto::todolist::{Todolist, TodolistId};

/// In-memory todolist collection, newest first.
///
/// Thread-safe via [`RwLock`]. Ids are server-minted UUIDs; the `order`
/// field decreases with each insertion so that newer lists sort first.
#[derive(Debug, Default)]
pub struct TodolistStore {
    records: RwLock<Vec<Todolist>>,
}

impl TodolistStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collection, newest first.
    pub async fn list(&self) -> Vec<Todolist> {
        self.records.read().await.clone()
    }

    /// Creates a todolist with a fresh id and returns it.
    pub async fn create(&self, title: &str) -> Todolist {
        let mut records = self.records.write().await;
        let order = -i64::try_from(records.len()).unwrap_or(i64::MAX);
        let todolist = Todolist {
            id: TodolistId::new(Uuid::new_v4().to_string()),
            title: title.to_string(),
            added_date: Utc::now(),
            order,
        };
        records.insert(0, todolist.clone());
        todolist
    }

    /// Removes the todolist with the given id, returning whether it existed.
    pub async fn remove(&self, id: &TodolistId) -> bool {
        let mut records = self.records.write().await;
        match records.iter().position(|t| t.id == *id) {
            Some(index) => {
                records.remove(index);
                true
            }
            None => false,
        }
    }

    /// Retitles the todolist with the given id, returning whether it existed.
    pub async fn rename(&self, id: &TodolistId, title: &str) -> bool {
        let mut records = self.records.write().await;
        match records.iter_mut().find(|t| t.id == *id) {
            Some(todolist) => {
                todolist.title = title.to_string();
                true
            }
            None => false,
        }
    }

    /// Number of todolists currently stored.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store is empty.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}
