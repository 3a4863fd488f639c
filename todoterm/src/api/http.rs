//! reqwest-backed API client.
//!
//! Decorates every request with the configured `API-KEY` header and, when
//! the token store holds one, an `Authorization: Bearer` token.

use std::time::Duration;

use reqwest::RequestBuilder;
use serde::de::DeserializeOwned;
use serde::Serialize;
use url::Url;

use todoterm_proto::auth::{LoginData, LoginRequest, MeData};
use todoterm_proto::captcha::CaptchaChallenge;
use todoterm_proto::response::{ApiResponse, Empty};
use todoterm_proto::todolist::{Todolist, TodolistCreated, TodolistId};

use crate::auth::session::{TokenStore, AUTH_TOKEN};

use super::{ApiError, TodoApi};

/// Name of the header carrying the API key.
const API_KEY_HEADER: &str = "API-KEY";

/// HTTP client for the todolist REST API.
pub struct HttpApi<S: TokenStore> {
    http: reqwest::Client,
    base_url: Url,
    api_key: Option<String>,
    tokens: S,
}

#[derive(Serialize)]
struct TitlePayload<'a> {
    title: &'a str,
}

impl<S: TokenStore> HttpApi<S> {
    /// Creates a client for the given base URL.
    ///
    /// The base URL must end with a slash for relative endpoint paths to
    /// join correctly (e.g. `https://example.com/api/1.1/`).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Url`] when the base URL does not parse, or
    /// [`ApiError::Http`] when the underlying client cannot be built.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        tokens: S,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let base_url = Url::parse(base_url)?;
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url,
            api_key,
            tokens,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    /// Attaches the API key and bearer token (when present).
    fn decorate(&self, request: RequestBuilder) -> Result<RequestBuilder, ApiError> {
        let mut request = request;
        if let Some(ref key) = self.api_key {
            request = request.header(API_KEY_HEADER, key);
        }
        if let Some(token) = self.tokens.get(AUTH_TOKEN)? {
            request = request.bearer_auth(token);
        }
        Ok(request)
    }

    async fn execute<T: DeserializeOwned + Send>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = self.decorate(request)?.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), "request failed");
            return Err(ApiError::Status(status.as_u16()));
        }
        Ok(response.json().await?)
    }
}

impl<S: TokenStore> TodoApi for HttpApi<S> {
    async fn login(&self, request: &LoginRequest) -> Result<ApiResponse<LoginData>, ApiError> {
        self.execute(self.http.post(self.endpoint("auth/login")?).json(request))
            .await
    }

    async fn logout(&self) -> Result<ApiResponse<Empty>, ApiError> {
        self.execute(self.http.delete(self.endpoint("auth/login")?))
            .await
    }

    async fn me(&self) -> Result<ApiResponse<MeData>, ApiError> {
        self.execute(self.http.get(self.endpoint("auth/me")?)).await
    }

    async fn captcha_url(&self) -> Result<CaptchaChallenge, ApiError> {
        self.execute(self.http.get(self.endpoint("security/get-captcha-url")?))
            .await
    }

    async fn todolists(&self) -> Result<Vec<Todolist>, ApiError> {
        self.execute(self.http.get(self.endpoint("todo-lists")?))
            .await
    }

    async fn create_todolist(&self, title: &str) -> Result<ApiResponse<TodolistCreated>, ApiError> {
        self.execute(
            self.http
                .post(self.endpoint("todo-lists")?)
                .json(&TitlePayload { title }),
        )
        .await
    }

    async fn delete_todolist(&self, id: &TodolistId) -> Result<ApiResponse<Empty>, ApiError> {
        self.execute(self.http.delete(self.endpoint(&format!("todo-lists/{id}"))?))
            .await
    }

    async fn rename_todolist(
        &self,
        id: &TodolistId,
        title: &str,
    ) -> Result<ApiResponse<Empty>, ApiError> {
        self.execute(
            self.http
                .put(self.endpoint(&format!("todo-lists/{id}"))?)
                .json(&TitlePayload { title }),
        )
        .await
    }
}
