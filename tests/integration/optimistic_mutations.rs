//! Integration tests for the optimistic mutation protocol against the
//! in-process dev server.
//!
//! Verifies the two core scenarios end to end:
//! - optimistic delete/rename success: the edit is visible immediately,
//!   the remote call succeeds, and the edit is committed (no rollback);
//! - optimistic delete/rename failure: the remote call is rejected and the
//!   snapshot is restored exactly (original index, original title).

use std::sync::Arc;
use std::time::Duration;

use todoterm::api::{ApiError, HttpApi};
use todoterm::auth::{Credentials, LoginAttempt, LoginFlow, MemoryTokenStore, SessionState};
use todoterm::cache::QueryCache;
use todoterm::todolists::{TodolistError, TodolistManager};
use todoterm_proto::todolist::TodolistId;
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

/// Logs in and returns a manager whose cache is seeded with two todolists
/// ("A" older, "B" newer; snapshot order is newest first).
async fn logged_in_manager(base_url: &str) -> TodolistManager<TestApi> {
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

    let manager = TodolistManager::new(make_api(base_url, &tokens), Arc::new(QueryCache::new()));
    manager.add("A").await.unwrap();
    manager.add("B").await.unwrap();
    manager.refresh().await.unwrap();
    manager
}

// ===========================================================================
// Optimistic delete
// ===========================================================================

#[tokio::test]
async fn optimistic_delete_success_commits_the_edit() {
    let (server_state, base_url) = spawn_server().await;
    let manager = logged_in_manager(&base_url).await;
    let target = manager.todolists()[1].id.clone();

    manager.remove(&target).await.unwrap();

    // The edit survived (committed, not rolled back) ...
    let snapshot = manager.todolists();
    assert_eq!(snapshot.len(), 1);
    assert_eq!(snapshot[0].title, "B");
    // ... and the server agrees.
    assert_eq!(server_state.store.len().await, 1);

    // A refetch confirms client and server converged.
    let refreshed = manager.refresh().await.unwrap();
    assert_eq!(refreshed.len(), 1);
    assert_eq!(refreshed[0].title, "B");
}

#[tokio::test]
async fn optimistic_delete_failure_restores_the_snapshot() {
    let (server_state, base_url) = spawn_server().await;
    let manager = logged_in_manager(&base_url).await;
    let before = manager.todolists();
    let target = before[1].id.clone();

    server_state.fail_next_mutation();
    let err = manager.remove(&target).await.unwrap_err();

    assert!(matches!(err, TodolistError::Rejected { .. }));
    // Restored exactly: same entities, same order.
    assert_eq!(manager.todolists(), before);
    // The server never deleted anything.
    assert_eq!(server_state.store.len().await, 2);
}

#[tokio::test]
async fn delete_of_an_id_the_server_does_not_know_rolls_back() {
    let (_state, base_url) = spawn_server().await;
    let manager = logged_in_manager(&base_url).await;
    let before = manager.todolists();

    let err = manager
        .remove(&TodolistId::new("not-a-real-id"))
        .await
        .unwrap_err();

    assert!(matches!(err, TodolistError::Rejected { .. }));
    assert_eq!(manager.todolists(), before);
}

// ===========================================================================
// Optimistic rename
// ===========================================================================

#[tokio::test]
async fn optimistic_rename_success_commits_the_edit() {
    let (server_state, base_url) = spawn_server().await;
    let manager = logged_in_manager(&base_url).await;
    let target = manager.todolists()[0].id.clone();

    manager.rename(&target, "B renamed").await.unwrap();

    assert_eq!(manager.todolists()[0].title, "B renamed");
    let server_lists = server_state.store.list().await;
    assert_eq!(server_lists[0].title, "B renamed");
}

#[tokio::test]
async fn optimistic_rename_failure_restores_the_title() {
    let (server_state, base_url) = spawn_server().await;
    let manager = logged_in_manager(&base_url).await;
    let target = manager.todolists()[0].id.clone();

    server_state.fail_next_mutation();
    let err = manager.rename(&target, "B renamed").await.unwrap_err();

    assert!(matches!(err, TodolistError::Rejected { .. }));
    assert_eq!(manager.todolists()[0].title, "B");
    assert_eq!(server_state.store.list().await[0].title, "B");
}

// ===========================================================================
// Transport-level failure
// ===========================================================================

#[tokio::test]
async fn unauthorized_mutation_rolls_back() {
    let (server_state, base_url) = spawn_server().await;
    let manager = logged_in_manager(&base_url).await;
    let before = manager.todolists();
    let target = before[0].id.clone();

    // An unauthenticated client sees the same collection only through the
    // cache it seeded; its mutation is refused with an HTTP status.
    let tokens = Arc::new(MemoryTokenStore::new());
    let cache = Arc::new(QueryCache::new());
    let anonymous = TodolistManager::new(make_api(&base_url, &tokens), Arc::clone(&cache));
    cache.replace(&todoterm::cache::QueryKey::todolists(), before.clone());

    let err = anonymous.remove(&target).await.unwrap_err();

    assert!(matches!(err, TodolistError::Api(ApiError::Status(401))));
    // Rolled back locally; untouched remotely.
    assert_eq!(anonymous.todolists(), before);
    assert_eq!(server_state.store.len().await, 2);
}

#[tokio::test]
async fn mutations_on_the_same_key_resolve_in_dispatch_order() {
    let (_state, base_url) = spawn_server().await;
    let manager = logged_in_manager(&base_url).await;
    let ids: Vec<TodolistId> = manager.todolists().iter().map(|t| t.id.clone()).collect();

    // FIFO per key: each mutation fully resolves before the next dispatch.
    manager.remove(&ids[0]).await.unwrap();
    manager.remove(&ids[1]).await.unwrap();

    assert!(manager.todolists().is_empty());
    let refreshed = manager.refresh().await.unwrap();
    assert!(refreshed.is_empty());
}
