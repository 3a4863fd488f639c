//! Scripted in-process API client for tests.
//!
//! Responses are enqueued per endpoint; when a queue is empty the stub
//! answers with a plausible success. Every call is recorded so tests can
//! assert exactly which requests were issued (e.g. "the captcha was
//! fetched exactly once", "validation errors never reach the network").

use std::collections::VecDeque;

use parking_lot::Mutex;

use todoterm_proto::auth::{LoginData, LoginRequest, MeData};
use todoterm_proto::captcha::CaptchaChallenge;
use todoterm_proto::response::{ApiResponse, Empty};
use todoterm_proto::todolist::{Todolist, TodolistCreated, TodolistId};

use super::{ApiError, TodoApi};

/// Which endpoint a recorded call hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StubCall {
    /// `POST auth/login`.
    Login,
    /// `DELETE auth/login`.
    Logout,
    /// `GET auth/me`.
    Me,
    /// `GET security/get-captcha-url`.
    CaptchaUrl,
    /// `GET todo-lists`.
    Todolists,
    /// `POST todo-lists`.
    Create,
    /// `DELETE todo-lists/{id}`.
    Delete,
    /// `PUT todo-lists/{id}`.
    Rename,
}

/// A scripted response: either an envelope or a connection failure.
type Scripted<T> = Result<T, String>;

/// Scripted API client.
#[derive(Debug)]
pub struct StubApi {
    login_queue: Mutex<VecDeque<Scripted<ApiResponse<LoginData>>>>,
    me_queue: Mutex<VecDeque<Scripted<ApiResponse<MeData>>>>,
    create_queue: Mutex<VecDeque<Scripted<ApiResponse<TodolistCreated>>>>,
    delete_queue: Mutex<VecDeque<Scripted<ApiResponse<Empty>>>>,
    rename_queue: Mutex<VecDeque<Scripted<ApiResponse<Empty>>>>,
    todolists: Mutex<Vec<Todolist>>,
    challenge: Mutex<CaptchaChallenge>,
    calls: Mutex<Vec<StubCall>>,
}

impl Default for StubApi {
    fn default() -> Self {
        Self::new()
    }
}

impl StubApi {
    /// Creates a stub that answers every request with a default success.
    #[must_use]
    pub fn new() -> Self {
        Self {
            login_queue: Mutex::new(VecDeque::new()),
            me_queue: Mutex::new(VecDeque::new()),
            create_queue: Mutex::new(VecDeque::new()),
            delete_queue: Mutex::new(VecDeque::new()),
            rename_queue: Mutex::new(VecDeque::new()),
            todolists: Mutex::new(Vec::new()),
            challenge: Mutex::new(CaptchaChallenge {
                url: "https://captcha.example/stub.png".to_string(),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Scripts the next login response.
    pub fn enqueue_login(&self, response: ApiResponse<LoginData>) {
        self.login_queue.lock().push_back(Ok(response));
    }

    /// Scripts the next login request to fail at the transport level.
    pub fn enqueue_login_failure(&self, reason: &str) {
        self.login_queue.lock().push_back(Err(reason.to_string()));
    }

    /// Scripts the next `auth/me` response.
    pub fn enqueue_me(&self, response: ApiResponse<MeData>) {
        self.me_queue.lock().push_back(Ok(response));
    }

    /// Scripts the next create response.
    pub fn enqueue_create(&self, response: ApiResponse<TodolistCreated>) {
        self.create_queue.lock().push_back(Ok(response));
    }

    /// Scripts the next delete response.
    pub fn enqueue_delete(&self, response: ApiResponse<Empty>) {
        self.delete_queue.lock().push_back(Ok(response));
    }

    /// Scripts the next delete request to fail at the transport level.
    pub fn enqueue_delete_failure(&self, reason: &str) {
        self.delete_queue.lock().push_back(Err(reason.to_string()));
    }

    /// Scripts the next rename response.
    pub fn enqueue_rename(&self, response: ApiResponse<Empty>) {
        self.rename_queue.lock().push_back(Ok(response));
    }

    /// Scripts the next rename request to fail at the transport level.
    pub fn enqueue_rename_failure(&self, reason: &str) {
        self.rename_queue.lock().push_back(Err(reason.to_string()));
    }

    /// Sets the collection returned by `todolists()`.
    pub fn set_todolists(&self, todolists: Vec<Todolist>) {
        *self.todolists.lock() = todolists;
    }

    /// Sets the challenge returned by `captcha_url()`.
    pub fn set_challenge(&self, challenge: CaptchaChallenge) {
        *self.challenge.lock() = challenge;
    }

    /// All recorded calls, in issue order.
    #[must_use]
    pub fn calls(&self) -> Vec<StubCall> {
        self.calls.lock().clone()
    }

    /// How many times the given endpoint was hit.
    #[must_use]
    pub fn call_count(&self, call: StubCall) -> usize {
        self.calls.lock().iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: StubCall) {
        self.calls.lock().push(call);
    }

    fn next<T>(queue: &Mutex<VecDeque<Scripted<T>>>, default: T) -> Result<T, ApiError> {
        match queue.lock().pop_front() {
            Some(Ok(response)) => Ok(response),
            Some(Err(reason)) => Err(ApiError::Connection(reason)),
            None => Ok(default),
        }
    }
}

impl TodoApi for StubApi {
    async fn login(&self, _request: &LoginRequest) -> Result<ApiResponse<LoginData>, ApiError> {
        self.record(StubCall::Login);
        Self::next(
            &self.login_queue,
            ApiResponse::success(LoginData {
                user_id: Some(1),
                token: Some("stub-token".to_string()),
            }),
        )
    }

    async fn logout(&self) -> Result<ApiResponse<Empty>, ApiError> {
        self.record(StubCall::Logout);
        Ok(ApiResponse::success(Empty {}))
    }

    async fn me(&self) -> Result<ApiResponse<MeData>, ApiError> {
        self.record(StubCall::Me);
        Self::next(
            &self.me_queue,
            ApiResponse::success(MeData {
                id: 1,
                email: "stub@example.com".to_string(),
                login: "stub".to_string(),
            }),
        )
    }

    async fn captcha_url(&self) -> Result<CaptchaChallenge, ApiError> {
        self.record(StubCall::CaptchaUrl);
        Ok(self.challenge.lock().clone())
    }

    async fn todolists(&self) -> Result<Vec<Todolist>, ApiError> {
        self.record(StubCall::Todolists);
        Ok(self.todolists.lock().clone())
    }

    async fn create_todolist(&self, title: &str) -> Result<ApiResponse<TodolistCreated>, ApiError> {
        self.record(StubCall::Create);
        let count = self.call_count(StubCall::Create);
        Self::next(
            &self.create_queue,
            ApiResponse::success(TodolistCreated {
                item: Todolist {
                    id: TodolistId::new(format!("stub-{count}")),
                    title: title.to_string(),
                    added_date: chrono::Utc::now(),
                    order: 0,
                },
            }),
        )
    }

    async fn delete_todolist(&self, _id: &TodolistId) -> Result<ApiResponse<Empty>, ApiError> {
        self.record(StubCall::Delete);
        Self::next(&self.delete_queue, ApiResponse::success(Empty {}))
    }

    async fn rename_todolist(
        &self,
        _id: &TodolistId,
        _title: &str,
    ) -> Result<ApiResponse<Empty>, ApiError> {
        self.record(StubCall::Rename);
        Self::next(&self.rename_queue, ApiResponse::success(Empty {}))
    }
}
