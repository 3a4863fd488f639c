//! API client layer.
//!
//! Defines the [`TodoApi`] trait that the login flow and todolist manager
//! program against. Concrete implementations:
//! - [`http::HttpApi`] — reqwest-backed client for the real REST API
//! - [`stub::StubApi`] — scripted in-process client for tests

pub mod http;
pub mod stub;

pub use http::HttpApi;
pub use stub::StubApi;

use std::future::Future;

use todoterm_proto::auth::{LoginData, LoginRequest, MeData};
use todoterm_proto::captcha::CaptchaChallenge;
use todoterm_proto::response::{ApiResponse, Empty};
use todoterm_proto::todolist::{Todolist, TodolistCreated, TodolistId};

use crate::auth::session::TokenStoreError;

/// Errors that can occur while talking to the API.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// The HTTP request failed (connect, timeout, body decode).
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A request URL could not be built from the configured base URL.
    #[error("invalid request url: {0}")]
    Url(#[from] url::ParseError),

    /// The server answered with a non-success HTTP status.
    #[error("server answered with HTTP status {0}")]
    Status(u16),

    /// The connection could not be established.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The token store could not be read while decorating the request.
    #[error("token store error: {0}")]
    TokenStore(#[from] TokenStoreError),
}

/// The REST endpoints the client consumes.
///
/// Every method issues exactly one request. Result codes inside the
/// response envelope are NOT mapped to `Err` here — interpreting them is
/// the caller's concern (the login flow branches on them, the todolist
/// manager commits or rolls back on them).
pub trait TodoApi: Send + Sync {
    /// `POST auth/login`.
    fn login(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<ApiResponse<LoginData>, ApiError>> + Send;

    /// `DELETE auth/login`.
    fn logout(&self) -> impl Future<Output = Result<ApiResponse<Empty>, ApiError>> + Send;

    /// `GET auth/me`.
    fn me(&self) -> impl Future<Output = Result<ApiResponse<MeData>, ApiError>> + Send;

    /// `GET security/get-captcha-url`.
    fn captcha_url(&self) -> impl Future<Output = Result<CaptchaChallenge, ApiError>> + Send;

    /// `GET todo-lists` (bare collection, no envelope).
    fn todolists(&self) -> impl Future<Output = Result<Vec<Todolist>, ApiError>> + Send;

    /// `POST todo-lists`.
    fn create_todolist(
        &self,
        title: &str,
    ) -> impl Future<Output = Result<ApiResponse<TodolistCreated>, ApiError>> + Send;

    /// `DELETE todo-lists/{id}`.
    fn delete_todolist(
        &self,
        id: &TodolistId,
    ) -> impl Future<Output = Result<ApiResponse<Empty>, ApiError>> + Send;

    /// `PUT todo-lists/{id}`.
    fn rename_todolist(
        &self,
        id: &TodolistId,
        title: &str,
    ) -> impl Future<Output = Result<ApiResponse<Empty>, ApiError>> + Send;
}
