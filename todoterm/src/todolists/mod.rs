//! Client-side todolist domain model.
//!
//! Wire [`Todolist`]s are augmented with a client-only filter before they
//! enter the cache; the filter never leaves the client.

pub mod manager;

pub use manager::TodolistManager;

use chrono::{DateTime, Utc};
use thiserror::Error;
use todoterm_proto::response::ResultCode;
use todoterm_proto::todolist::{TitleError, Todolist, TodolistId};

use crate::api::ApiError;

/// Which tasks of a todolist the client should display.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TodolistFilter {
    /// Show every task.
    #[default]
    All,
    /// Show unfinished tasks only.
    Active,
    /// Show finished tasks only.
    Completed,
}

impl std::fmt::Display for TodolistFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Active => write!(f, "active"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

/// A todolist as the client tracks it: the wire entity plus the
/// client-only display filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DomainTodolist {
    /// Server-assigned identifier.
    pub id: TodolistId,
    /// Display title.
    pub title: String,
    /// When the todolist was created.
    pub added_date: DateTime<Utc>,
    /// Server-side ordering hint.
    pub order: i64,
    /// Client-side display filter, never sent to the server.
    pub filter: TodolistFilter,
}

impl From<Todolist> for DomainTodolist {
    fn from(todolist: Todolist) -> Self {
        Self {
            id: todolist.id,
            title: todolist.title,
            added_date: todolist.added_date,
            order: todolist.order,
            filter: TodolistFilter::All,
        }
    }
}

/// Errors that can occur during todolist operations.
#[derive(Debug, Error)]
pub enum TodolistError {
    /// The request never completed (transport, HTTP status, token store).
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The title failed local validation; nothing was sent.
    #[error("{0}")]
    InvalidTitle(#[from] TitleError),

    /// The server answered with a non-success result code.
    #[error("server rejected the request: {code}")]
    Rejected {
        /// The result code the server answered with.
        code: ResultCode,
        /// Server-provided diagnostics.
        messages: Vec<String>,
    },
}
