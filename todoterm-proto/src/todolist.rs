//! Todolist entity and title validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Maximum allowed todolist title length in characters.
pub const MAX_TITLE_LENGTH: usize = 100;

/// Server-assigned identifier of a todolist.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodolistId(String);

impl TodolistId {
    /// Creates an identifier from its string representation.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TodolistId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A todolist as the server represents it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todolist {
    /// Server-assigned identifier.
    pub id: TodolistId,
    /// Display title.
    pub title: String,
    /// When the todolist was created.
    pub added_date: DateTime<Utc>,
    /// Server-side ordering hint (lower sorts first).
    pub order: i64,
}

/// Payload of a successful `POST todo-lists`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodolistCreated {
    /// The freshly created todolist.
    pub item: Todolist,
}

/// Title validation errors for create and rename requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TitleError {
    /// Title is empty.
    #[error("title cannot be empty")]
    Empty,
    /// Title exceeds [`MAX_TITLE_LENGTH`].
    #[error("title too long (max {MAX_TITLE_LENGTH} characters)")]
    TooLong,
}

/// Validates a todolist title before it is sent to the server.
///
/// # Errors
///
/// Returns [`TitleError::Empty`] for an empty title, or
/// [`TitleError::TooLong`] when it exceeds [`MAX_TITLE_LENGTH`] characters.
pub fn validate_title(title: &str) -> Result<(), TitleError> {
    if title.is_empty() {
        return Err(TitleError::Empty);
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(TitleError::TooLong);
    }
    Ok(())
}
