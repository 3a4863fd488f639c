//! Shared wire types for the TodoTerm REST API.

pub mod auth;
pub mod captcha;
pub mod response;
pub mod todolist;
