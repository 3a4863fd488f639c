//! Todolist manager: drives the optimistic mutation protocol end to end.
//!
//! Every mutating operation dispatches its patch to the [`QueryCache`]
//! before the remote call is issued, then resolves the pending mutation to
//! exactly one of commit (remote success) or rollback (remote failure).

use std::collections::HashMap;
use std::sync::Arc;

use todoterm_proto::response::{ApiResponse, ResultCode};
use todoterm_proto::todolist::{validate_title, TodolistId};

use crate::api::TodoApi;
use crate::cache::{QueryCache, QueryKey, TodolistPatch};

use super::{DomainTodolist, TodolistError, TodolistFilter};

/// Application-layer interface over the todolist collection.
pub struct TodolistManager<A: TodoApi> {
    api: A,
    cache: Arc<QueryCache>,
    key: QueryKey,
}

impl<A: TodoApi> TodolistManager<A> {
    /// Creates a manager over the given API client and cache.
    pub fn new(api: A, cache: Arc<QueryCache>) -> Self {
        Self {
            api,
            cache,
            key: QueryKey::todolists(),
        }
    }

    /// Returns the cached todolists (empty until [`refresh`](Self::refresh)
    /// has run).
    #[must_use]
    pub fn todolists(&self) -> Vec<DomainTodolist> {
        self.cache.snapshot(&self.key)
    }

    /// Fetches the collection from the server and replaces the snapshot.
    ///
    /// Wire entities enter the domain with filter `All`; filters already
    /// chosen locally for surviving ids are preserved.
    ///
    /// # Errors
    ///
    /// Returns [`TodolistError::Api`] if the request fails.
    pub async fn refresh(&self) -> Result<Vec<DomainTodolist>, TodolistError> {
        let wire = self.api.todolists().await?;

        let filters: HashMap<TodolistId, TodolistFilter> = self
            .cache
            .snapshot(&self.key)
            .into_iter()
            .map(|t| (t.id, t.filter))
            .collect();

        let domain: Vec<DomainTodolist> = wire
            .into_iter()
            .map(|t| {
                let filter = filters.get(&t.id).copied().unwrap_or_default();
                let mut todolist = DomainTodolist::from(t);
                todolist.filter = filter;
                todolist
            })
            .collect();

        self.cache.replace(&self.key, domain.clone());
        tracing::debug!(count = domain.len(), "refreshed todolist snapshot");
        Ok(domain)
    }

    /// Creates a todolist and inserts the server-returned item at the head
    /// of the snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`TodolistError::InvalidTitle`] before any request is sent,
    /// [`TodolistError::Api`] on transport failure, or
    /// [`TodolistError::Rejected`] when the server answers with a
    /// non-success result code.
    pub async fn add(&self, title: &str) -> Result<DomainTodolist, TodolistError> {
        validate_title(title)?;

        let ApiResponse {
            result_code,
            messages,
            data,
            ..
        } = self.api.create_todolist(title).await?;

        let item = match (result_code, data) {
            (ResultCode::Success, Some(created)) => created.item,
            (code, _) => return Err(TodolistError::Rejected { code, messages }),
        };

        let todolist = DomainTodolist::from(item);
        self.cache.apply(
            &self.key,
            &TodolistPatch::Insert {
                index: 0,
                todolist: todolist.clone(),
            },
        );
        Ok(todolist)
    }

    /// Deletes a todolist optimistically.
    ///
    /// The entity disappears from the snapshot immediately; it is restored
    /// at its original index when the remote call fails.
    ///
    /// # Errors
    ///
    /// Returns [`TodolistError::Api`] or [`TodolistError::Rejected`]; both
    /// roll the snapshot back before returning.
    pub async fn remove(&self, id: &TodolistId) -> Result<(), TodolistError> {
        let pending = self
            .cache
            .apply_optimistic(&self.key, &TodolistPatch::RemoveById { id: id.clone() });

        match self.api.delete_todolist(id).await {
            Ok(response) if response.is_success() => {
                self.cache.commit(pending);
                Ok(())
            }
            Ok(response) => {
                self.cache.rollback(pending);
                Err(TodolistError::Rejected {
                    code: response.result_code,
                    messages: response.messages,
                })
            }
            Err(e) => {
                self.cache.rollback(pending);
                Err(e.into())
            }
        }
    }

    /// Renames a todolist optimistically.
    ///
    /// The new title is visible immediately; the previous title is restored
    /// when the remote call fails.
    ///
    /// # Errors
    ///
    /// Returns [`TodolistError::InvalidTitle`] before any request is sent,
    /// or [`TodolistError::Api`] / [`TodolistError::Rejected`] after a
    /// rollback.
    pub async fn rename(&self, id: &TodolistId, title: &str) -> Result<(), TodolistError> {
        validate_title(title)?;

        let pending = self.cache.apply_optimistic(
            &self.key,
            &TodolistPatch::SetTitle {
                id: id.clone(),
                title: title.to_string(),
            },
        );

        match self.api.rename_todolist(id, title).await {
            Ok(response) if response.is_success() => {
                self.cache.commit(pending);
                Ok(())
            }
            Ok(response) => {
                self.cache.rollback(pending);
                Err(TodolistError::Rejected {
                    code: response.result_code,
                    messages: response.messages,
                })
            }
            Err(e) => {
                self.cache.rollback(pending);
                Err(e.into())
            }
        }
    }

    /// Sets the client-side display filter of a todolist.
    ///
    /// Local-only: the edit is final immediately and no request is issued.
    pub fn set_filter(&self, id: &TodolistId, filter: TodolistFilter) {
        self.cache.apply(
            &self.key,
            &TodolistPatch::SetFilter {
                id: id.clone(),
                filter,
            },
        );
    }
}
