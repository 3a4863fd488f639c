//! TodoTerm — terminal todolist client library.

pub mod api;
pub mod auth;
pub mod cache;
pub mod config;
pub mod todolists;
