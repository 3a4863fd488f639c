//! Server core: shared state, router, and request handlers.
//!
//! Authentication escalates to a captcha challenge after a configurable
//! number of failed attempts; todolist endpoints require a bearer token.
//! The state handle exposes [`ServerState::fail_next_mutation`] so tests
//! can force the next mutating todolist request to be rejected without
//! touching the collection.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use uuid::Uuid;

use todoterm_proto::auth::{LoginData, LoginRequest, MeData};
use todoterm_proto::captcha::CaptchaChallenge;
use todoterm_proto::response::{ApiResponse, Empty, ResultCode};
use todoterm_proto::todolist::{validate_title, Todolist, TodolistCreated, TodolistId};

use crate::config::ServerConfig;
use crate::store::TodolistStore;

/// Errors that can occur while starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// The listener could not be bound.
    #[error("failed to bind server: {0}")]
    Io(#[from] std::io::Error),
}

/// Captcha gate: tracks failed logins and the currently minted challenge.
#[derive(Debug, Default)]
struct AuthGate {
    failed_attempts: u32,
    captcha: Option<String>,
}

/// Shared server state: account, sessions, todolists, and the captcha gate.
pub struct ServerState {
    email: String,
    password: String,
    captcha_after_failures: u32,
    /// The in-memory todolist collection.
    pub store: TodolistStore,
    sessions: RwLock<HashSet<String>>,
    gate: RwLock<AuthGate>,
    fail_next: AtomicBool,
}

impl Default for ServerState {
    fn default() -> Self {
        Self::new(&ServerConfig::default())
    }
}

impl ServerState {
    /// Creates state for the given configuration with an empty collection.
    #[must_use]
    pub fn new(config: &ServerConfig) -> Self {
        Self {
            email: config.email.clone(),
            password: config.password.clone(),
            captcha_after_failures: config.captcha_after_failures,
            store: TodolistStore::new(),
            sessions: RwLock::new(HashSet::new()),
            gate: RwLock::new(AuthGate::default()),
            fail_next: AtomicBool::new(false),
        }
    }

    /// The text of the currently minted captcha challenge, if any.
    ///
    /// Exposed for tests that need to answer the challenge.
    pub async fn current_captcha(&self) -> Option<String> {
        self.gate.read().await.captcha.clone()
    }

    /// How many consecutive failed login attempts have been counted.
    pub async fn failed_attempts(&self) -> u32 {
        self.gate.read().await.failed_attempts
    }

    /// Forces the next mutating todolist request to answer
    /// [`ResultCode::Error`] without touching the collection.
    pub fn fail_next_mutation(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    fn take_fail_next(&self) -> bool {
        self.fail_next.swap(false, Ordering::SeqCst)
    }

    async fn authorized(&self, headers: &HeaderMap) -> bool {
        match bearer_token(headers) {
            Some(token) => self.sessions.read().await.contains(&token),
            None => false,
        }
    }
}

/// Extracts the bearer token from the `Authorization` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::to_string)
}

/// Mints a short captcha code.
fn mint_captcha_code() -> String {
    let mut code = Uuid::new_v4().simple().to_string();
    code.truncate(8);
    code
}

/// Builds the API router over the given state.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/auth/login", post(login).delete(logout))
        .route("/auth/me", get(me))
        .route("/security/get-captcha-url", get(captcha_url))
        .route("/todo-lists", get(list_todolists).post(create_todolist))
        .route(
            "/todo-lists/{id}",
            axum::routing::delete(remove_todolist).put(rename_todolist),
        )
        .with_state(state)
}

/// Binds a listener and serves the API on a background task.
///
/// Returns the bound address (useful with a `:0` port) and the task handle.
///
/// # Errors
///
/// Returns [`ServerError::Io`] when the address cannot be bound.
pub async fn start_with_state(
    addr: &str,
    state: Arc<ServerState>,
) -> Result<(SocketAddr, JoinHandle<()>), ServerError> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    let bound_addr = listener.local_addr()?;
    let app = router(state);

    let handle = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!(error = %e, "server task failed");
        }
    });

    Ok((bound_addr, handle))
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn login(
    State(state): State<Arc<ServerState>>,
    Json(request): Json<LoginRequest>,
) -> Json<ApiResponse<LoginData>> {
    let mut gate = state.gate.write().await;

    if gate.failed_attempts >= state.captcha_after_failures {
        let answered = match (&gate.captcha, &request.captcha) {
            (Some(expected), Some(given)) => given.trim().eq_ignore_ascii_case(expected),
            _ => false,
        };
        if !answered {
            tracing::info!("login blocked pending captcha");
            return Json(ApiResponse::error(
                ResultCode::CaptchaRequired,
                "you must enter the captcha text",
            ));
        }
        // Challenges are single-use; a wrong password below forces a refetch.
        gate.captcha = None;
    }

    if request.email == state.email && request.password == state.password {
        gate.failed_attempts = 0;
        gate.captcha = None;
        drop(gate);

        let token = Uuid::new_v4().to_string();
        state.sessions.write().await.insert(token.clone());
        tracing::info!(email = %request.email, "login succeeded");
        Json(ApiResponse::success(LoginData {
            user_id: Some(1),
            token: Some(token),
        }))
    } else {
        gate.failed_attempts += 1;
        tracing::info!(attempts = gate.failed_attempts, "login rejected");
        Json(ApiResponse::error(
            ResultCode::Error,
            "Incorrect Email or Password",
        ))
    }
}

async fn logout(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
) -> Json<ApiResponse<Empty>> {
    if let Some(token) = bearer_token(&headers) {
        state.sessions.write().await.remove(&token);
    }
    Json(ApiResponse::success(Empty {}))
}

async fn me(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Json<ApiResponse<MeData>> {
    if state.authorized(&headers).await {
        Json(ApiResponse::success(MeData {
            id: 1,
            email: state.email.clone(),
            login: "todoterm".to_string(),
        }))
    } else {
        Json(ApiResponse::error(ResultCode::Error, "not authorized"))
    }
}

async fn captcha_url(State(state): State<Arc<ServerState>>) -> Json<CaptchaChallenge> {
    let code = mint_captcha_code();
    let mut gate = state.gate.write().await;
    gate.captcha = Some(code.clone());
    drop(gate);
    tracing::debug!(%code, "minted captcha challenge");
    Json(CaptchaChallenge {
        url: format!("https://captcha.todoterm.dev/{code}.png"),
    })
}

async fn list_todolists(State(state): State<Arc<ServerState>>, headers: HeaderMap) -> Response {
    if !state.authorized(&headers).await {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(state.store.list().await).into_response()
}

#[derive(Debug, serde::Deserialize)]
struct TitlePayload {
    title: String,
}

async fn create_todolist(
    State(state): State<Arc<ServerState>>,
    headers: HeaderMap,
    Json(request): Json<TitlePayload>,
) -> Response {
    if !state.authorized(&headers).await {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.take_fail_next() {
        return Json(ApiResponse::<TodolistCreated>::error(
            ResultCode::Error,
            "simulated failure",
        ))
        .into_response();
    }
    if let Err(e) = validate_title(&request.title) {
        return Json(ApiResponse::<TodolistCreated>::field_error(
            "title",
            e.to_string(),
        ))
        .into_response();
    }

    let item = state.store.create(&request.title).await;
    tracing::info!(id = %item.id, "todolist created");
    Json(ApiResponse::success(TodolistCreated { item })).into_response()
}

async fn remove_todolist(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Response {
    if !state.authorized(&headers).await {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.take_fail_next() {
        return Json(ApiResponse::<Empty>::error(
            ResultCode::Error,
            "simulated failure",
        ))
        .into_response();
    }

    let id = TodolistId::new(id);
    if state.store.remove(&id).await {
        tracing::info!(%id, "todolist removed");
        Json(ApiResponse::success(Empty {})).into_response()
    } else {
        Json(ApiResponse::<Empty>::error(
            ResultCode::Error,
            "todolist not found",
        ))
        .into_response()
    }
}

async fn rename_todolist(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(request): Json<TitlePayload>,
) -> Response {
    if !state.authorized(&headers).await {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if state.take_fail_next() {
        return Json(ApiResponse::<Empty>::error(
            ResultCode::Error,
            "simulated failure",
        ))
        .into_response();
    }
    if let Err(e) = validate_title(&request.title) {
        return Json(ApiResponse::<Empty>::field_error("title", e.to_string())).into_response();
    }

    let id = TodolistId::new(id);
    if state.store.rename(&id, &request.title).await {
        tracing::info!(%id, "todolist renamed");
        Json(ApiResponse::success(Empty {})).into_response()
    } else {
        Json(ApiResponse::<Empty>::error(
            ResultCode::Error,
            "todolist not found",
        ))
        .into_response()
    }
}
