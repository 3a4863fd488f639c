//! Reversible snapshot patches.
//!
//! A [`TodolistPatch`] transforms a [`Snapshot`] and yields the exact
//! inverse patch that restores the prior snapshot. Patches targeting an id
//! that is not present apply as safe no-ops whose inverse is also a no-op.
//!
//! Invariant: for every patch `p` and snapshot `s`,
//! `p.apply(s)` followed by applying the returned inverse restores `s`
//! exactly. Snapshot ids are unique (they are server-minted), which is what
//! makes the `Insert`/`RemoveById` pair a faithful round trip.

use todoterm_proto::todolist::TodolistId;

use crate::todolists::{DomainTodolist, TodolistFilter};

/// An ordered sequence of todolists associated with one query key.
pub type Snapshot = Vec<DomainTodolist>;

/// A reversible transformation over a [`Snapshot`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TodolistPatch {
    /// Insert a todolist at a position (clamped to the snapshot length).
    Insert {
        /// Position to insert at.
        index: usize,
        /// The todolist to insert.
        todolist: DomainTodolist,
    },
    /// Remove the todolist with the given id.
    RemoveById {
        /// Id of the todolist to remove.
        id: TodolistId,
    },
    /// Set the title of the todolist with the given id.
    SetTitle {
        /// Id of the todolist to retitle.
        id: TodolistId,
        /// The new title.
        title: String,
    },
    /// Set the client-side filter of the todolist with the given id.
    SetFilter {
        /// Id of the todolist to refilter.
        id: TodolistId,
        /// The new filter.
        filter: TodolistFilter,
    },
    /// Identity patch; the inverse of a patch that found no target.
    Noop,
}

impl TodolistPatch {
    /// Applies this patch to the snapshot, returning its inverse.
    ///
    /// Runs to completion synchronously; callers hold whatever lock guards
    /// the snapshot for the duration, so no reader observes a half-applied
    /// patch.
    #[must_use = "the returned inverse is required to undo this patch"]
    pub fn apply(&self, snapshot: &mut Snapshot) -> Self {
        match self {
            Self::Insert { index, todolist } => {
                let index = (*index).min(snapshot.len());
                snapshot.insert(index, todolist.clone());
                Self::RemoveById {
                    id: todolist.id.clone(),
                }
            }
            Self::RemoveById { id } => {
                match snapshot.iter().position(|t| t.id == *id) {
                    Some(index) => {
                        let todolist = snapshot.remove(index);
                        Self::Insert { index, todolist }
                    }
                    None => Self::Noop,
                }
            }
            Self::SetTitle { id, title } => {
                match snapshot.iter_mut().find(|t| t.id == *id) {
                    Some(todolist) => {
                        let previous = std::mem::replace(&mut todolist.title, title.clone());
                        Self::SetTitle {
                            id: id.clone(),
                            title: previous,
                        }
                    }
                    None => Self::Noop,
                }
            }
            Self::SetFilter { id, filter } => {
                match snapshot.iter_mut().find(|t| t.id == *id) {
                    Some(todolist) => {
                        let previous = std::mem::replace(&mut todolist.filter, *filter);
                        Self::SetFilter {
                            id: id.clone(),
                            filter: previous,
                        }
                    }
                    None => Self::Noop,
                }
            }
            Self::Noop => Self::Noop,
        }
    }
}
