//! Integration tests for the todolist CRUD surface and the response
//! envelope semantics of the dev server.

use std::sync::Arc;
use std::time::Duration;

use todoterm::api::{ApiError, HttpApi, TodoApi};
use todoterm::auth::{Credentials, LoginAttempt, LoginFlow, MemoryTokenStore, SessionState};
use todoterm::cache::QueryCache;
use todoterm::todolists::{TodolistFilter, TodolistManager};
use todoterm_proto::response::ResultCode;
use todoterm_proto::todolist::{TodolistId, MAX_TITLE_LENGTH};
use todoterm_server::server::{start_with_state, ServerState};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type TestApi = HttpApi<Arc<MemoryTokenStore>>;

async fn spawn_server() -> (Arc<ServerState>, String) {
    let state = Arc::new(ServerState::default());
    let (addr, _handle) = start_with_state("127.0.0.1:0", Arc::clone(&state))
        .await
        .unwrap();
    (state, format!("http://{addr}/"))
}

fn make_api(base_url: &str, tokens: &Arc<MemoryTokenStore>) -> TestApi {
    HttpApi::new(base_url, None, Arc::clone(tokens), Duration::from_secs(5)).unwrap()
}

/// Logs in and returns an authenticated API client.
async fn logged_in_api(base_url: &str) -> TestApi {
    let tokens = Arc::new(MemoryTokenStore::new());
    let session = Arc::new(SessionState::new());
    let mut flow = LoginFlow::new(make_api(base_url, &tokens), Arc::clone(&tokens), session);
    flow.submit(LoginAttempt {
        credentials: Credentials {
            email: "free@samuraijs.com".to_string(),
            password: "free".to_string(),
            remember_me: false,
        },
        captcha: None,
    })
    .await
    .unwrap();
    make_api(base_url, &tokens)
}

// ===========================================================================
// CRUD lifecycle
// ===========================================================================

#[tokio::test]
async fn created_lists_appear_newest_first() {
    let (_state, base_url) = spawn_server().await;
    let api = logged_in_api(&base_url).await;
    let manager = TodolistManager::new(api, Arc::new(QueryCache::new()));

    manager.add("First").await.unwrap();
    manager.add("Second").await.unwrap();

    let lists = manager.refresh().await.unwrap();
    assert_eq!(lists.len(), 2);
    assert_eq!(lists[0].title, "Second");
    assert_eq!(lists[1].title, "First");
    assert!(lists.iter().all(|l| l.filter == TodolistFilter::All));
}

#[tokio::test]
async fn full_lifecycle_converges_with_the_server() {
    let (server_state, base_url) = spawn_server().await;
    let api = logged_in_api(&base_url).await;
    let manager = TodolistManager::new(api, Arc::new(QueryCache::new()));

    let created = manager.add("Groceries").await.unwrap();
    manager.rename(&created.id, "Weekend groceries").await.unwrap();

    let lists = manager.refresh().await.unwrap();
    assert_eq!(lists[0].title, "Weekend groceries");

    manager.remove(&created.id).await.unwrap();
    assert!(manager.todolists().is_empty());
    assert!(server_state.store.is_empty().await);
}

#[tokio::test]
async fn refresh_preserves_filters_across_server_round_trips() {
    let (_state, base_url) = spawn_server().await;
    let api = logged_in_api(&base_url).await;
    let manager = TodolistManager::new(api, Arc::new(QueryCache::new()));

    let created = manager.add("Groceries").await.unwrap();
    manager.set_filter(&created.id, TodolistFilter::Active);

    let lists = manager.refresh().await.unwrap();
    assert_eq!(lists[0].filter, TodolistFilter::Active);
}

// ===========================================================================
// Server-side validation (field errors in the envelope)
// ===========================================================================

#[tokio::test]
async fn server_rejects_an_overlong_title_with_a_field_error() {
    let (_state, base_url) = spawn_server().await;
    let api = logged_in_api(&base_url).await;

    // Bypass client-side validation to exercise the server's.
    let long_title = "x".repeat(MAX_TITLE_LENGTH + 1);
    let response = api.create_todolist(&long_title).await.unwrap();

    assert_eq!(response.result_code, ResultCode::Error);
    assert_eq!(response.fields_errors[0].field, "title");
    assert!(response.data.is_none());
}

#[tokio::test]
async fn server_rejects_an_empty_title_on_rename() {
    let (server_state, base_url) = spawn_server().await;
    let api = logged_in_api(&base_url).await;
    let created = api.create_todolist("Valid").await.unwrap().data.unwrap().item;

    let response = api.rename_todolist(&created.id, "").await.unwrap();

    assert_eq!(response.result_code, ResultCode::Error);
    assert_eq!(response.fields_errors[0].field, "title");
    assert_eq!(server_state.store.list().await[0].title, "Valid");
}

#[tokio::test]
async fn mutating_an_unknown_id_is_rejected_in_the_envelope() {
    let (_state, base_url) = spawn_server().await;
    let api = logged_in_api(&base_url).await;

    let response = api
        .delete_todolist(&TodolistId::new("not-a-real-id"))
        .await
        .unwrap();
    assert_eq!(response.result_code, ResultCode::Error);
    assert_eq!(response.messages, vec!["todolist not found"]);
}

// ===========================================================================
// Authorization
// ===========================================================================

#[tokio::test]
async fn listing_requires_a_token() {
    let (_state, base_url) = spawn_server().await;
    let tokens = Arc::new(MemoryTokenStore::new());
    let api = make_api(&base_url, &tokens);

    let err = api.todolists().await.unwrap_err();
    assert!(matches!(err, ApiError::Status(401)));
}

#[tokio::test]
async fn me_reports_the_authenticated_account() {
    let (_state, base_url) = spawn_server().await;
    let api = logged_in_api(&base_url).await;

    let response = api.me().await.unwrap();
    assert_eq!(response.result_code, ResultCode::Success);
    let me = response.data.unwrap();
    assert_eq!(me.email, "free@samuraijs.com");
    assert_eq!(me.id, 1);
}

#[tokio::test]
async fn captcha_endpoint_needs_no_authentication() {
    let (server_state, base_url) = spawn_server().await;
    let tokens = Arc::new(MemoryTokenStore::new());
    let api = make_api(&base_url, &tokens);

    let challenge = api.captcha_url().await.unwrap();

    let code = server_state.current_captcha().await.unwrap();
    assert!(challenge.url.contains(&code));
}
