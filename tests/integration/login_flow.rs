//! Integration tests for the login flow against the in-process dev server.
//!
//! Covers the full state machine: success with token persistence, the
//! silent non-transition on rejected credentials, captcha escalation after
//! repeated failures, recovery by answering the challenge, and session
//! restore/logout.

use std::sync::Arc;
use std::time::Duration;

use todoterm::api::{HttpApi, TodoApi};
use todoterm::auth::{
    Credentials, LoginAttempt, LoginFlow, LoginState, MemoryTokenStore, SessionState, TokenStore,
    AUTH_TOKEN,
};
use todoterm_proto::response::ResultCode;
use todoterm_server::server::{start_with_state, ServerState};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

type TestApi = HttpApi<Arc<MemoryTokenStore>>;

/// Spawns a dev server on an ephemeral port; returns its state handle and
/// base URL.
async fn spawn_server() -> (Arc<ServerState>, String) {
    let state = Arc::new(ServerState::default());
    let (addr, _handle) = start_with_state("127.0.0.1:0", Arc::clone(&state))
        .await
        .unwrap();
    (state, format!("http://{addr}/"))
}

/// Builds an API client plus the shared token store and session it uses.
fn make_client(base_url: &str) -> (TestApi, Arc<MemoryTokenStore>, Arc<SessionState>) {
    let tokens = Arc::new(MemoryTokenStore::new());
    let api = HttpApi::new(base_url, None, Arc::clone(&tokens), Duration::from_secs(5)).unwrap();
    let session = Arc::new(SessionState::new());
    (api, tokens, session)
}

fn attempt(email: &str, password: &str, captcha: Option<&str>) -> LoginAttempt {
    LoginAttempt {
        credentials: Credentials {
            email: email.to_string(),
            password: password.to_string(),
            remember_me: false,
        },
        captcha: captcha.map(str::to_string),
    }
}

fn free_attempt() -> LoginAttempt {
    attempt("free@samuraijs.com", "free", None)
}

// ===========================================================================
// Success path
// ===========================================================================

#[tokio::test]
async fn login_success_persists_token_and_sets_flags() {
    let (_state, base_url) = spawn_server().await;
    let (api, tokens, session) = make_client(&base_url);
    let mut flow = LoginFlow::new(api, Arc::clone(&tokens), Arc::clone(&session));

    let state = flow.submit(free_attempt()).await.unwrap();

    assert_eq!(state, LoginState::Success);
    assert!(session.is_logged_in());
    assert!(!session.captcha_required());

    let token = tokens.get(AUTH_TOKEN).unwrap().unwrap();
    assert!(!token.is_empty());
}

#[tokio::test]
async fn token_authenticates_subsequent_requests() {
    let (_state, base_url) = spawn_server().await;
    let (api, tokens, session) = make_client(&base_url);
    let mut flow = LoginFlow::new(api, Arc::clone(&tokens), session);
    flow.submit(free_attempt()).await.unwrap();

    // A second client sharing the token store is authenticated.
    let api = HttpApi::new(
        &base_url,
        None,
        Arc::clone(&tokens),
        Duration::from_secs(5),
    )
    .unwrap();
    let response = api.me().await.unwrap();
    assert_eq!(response.result_code, ResultCode::Success);
    assert_eq!(response.data.unwrap().email, "free@samuraijs.com");
}

// ===========================================================================
// Rejected credentials (silent non-transition)
// ===========================================================================

#[tokio::test]
async fn wrong_password_leaves_the_flow_awaiting_resubmission() {
    let (_state, base_url) = spawn_server().await;
    let (api, tokens, session) = make_client(&base_url);
    let mut flow = LoginFlow::new(api, Arc::clone(&tokens), Arc::clone(&session));

    let state = flow
        .submit(attempt("free@samuraijs.com", "wrong", None))
        .await
        .unwrap();

    assert_eq!(state, LoginState::Idle);
    assert!(!session.is_logged_in());
    assert!(!session.captcha_required());
    assert_eq!(tokens.get(AUTH_TOKEN).unwrap(), None);
}

// ===========================================================================
// Captcha escalation and recovery
// ===========================================================================

#[tokio::test]
async fn repeated_failures_escalate_to_a_captcha_challenge() {
    let (server_state, base_url) = spawn_server().await;
    let (api, tokens, session) = make_client(&base_url);
    let mut flow = LoginFlow::new(api, Arc::clone(&tokens), Arc::clone(&session));

    for _ in 0..3 {
        let state = flow
            .submit(attempt("free@samuraijs.com", "wrong", None))
            .await
            .unwrap();
        assert_eq!(state, LoginState::Idle);
    }

    // The gate is now closed: even correct credentials demand a captcha.
    let state = flow.submit(free_attempt()).await.unwrap();
    assert_eq!(state, LoginState::CaptchaRequired);
    assert!(session.captcha_required());

    // The flow fetched a fresh challenge, which the server just minted.
    let code = server_state.current_captcha().await.unwrap();
    let challenge = flow.challenge().unwrap();
    assert!(challenge.url.contains(&code));
}

#[tokio::test]
async fn answering_the_captcha_completes_the_login() {
    let (server_state, base_url) = spawn_server().await;
    let (api, tokens, session) = make_client(&base_url);
    let mut flow = LoginFlow::new(api, Arc::clone(&tokens), Arc::clone(&session));

    for _ in 0..3 {
        flow.submit(attempt("free@samuraijs.com", "wrong", None))
            .await
            .unwrap();
    }
    flow.submit(free_attempt()).await.unwrap();
    assert_eq!(flow.state(), LoginState::CaptchaRequired);

    let code = server_state.current_captcha().await.unwrap();
    let state = flow.resubmit_with_captcha(code).await.unwrap();

    assert_eq!(state, LoginState::Success);
    assert!(session.is_logged_in());
    assert!(!session.captcha_required());
    assert!(tokens.get(AUTH_TOKEN).unwrap().is_some());
}

#[tokio::test]
async fn wrong_captcha_answer_refetches_a_fresh_challenge() {
    let (server_state, base_url) = spawn_server().await;
    let (api, tokens, session) = make_client(&base_url);
    let mut flow = LoginFlow::new(api, Arc::clone(&tokens), Arc::clone(&session));

    for _ in 0..3 {
        flow.submit(attempt("free@samuraijs.com", "wrong", None))
            .await
            .unwrap();
    }
    flow.submit(free_attempt()).await.unwrap();
    let first_code = server_state.current_captcha().await.unwrap();

    // A wrong answer keeps the gate closed and invalidates the challenge.
    let state = flow.resubmit_with_captcha("bogus").await.unwrap();
    assert_eq!(state, LoginState::CaptchaRequired);
    assert!(session.captcha_required());

    let second_code = server_state.current_captcha().await.unwrap();
    assert_ne!(first_code, second_code);

    // The fresh challenge works.
    let state = flow.resubmit_with_captcha(second_code).await.unwrap();
    assert_eq!(state, LoginState::Success);
}

// ===========================================================================
// Logout and session restore
// ===========================================================================

#[tokio::test]
async fn logout_invalidates_the_server_session() {
    let (_state, base_url) = spawn_server().await;
    let (api, tokens, session) = make_client(&base_url);
    let mut flow = LoginFlow::new(api, Arc::clone(&tokens), Arc::clone(&session));
    flow.submit(free_attempt()).await.unwrap();

    flow.logout().await.unwrap();

    assert!(!session.is_logged_in());
    assert_eq!(tokens.get(AUTH_TOKEN).unwrap(), None);

    // The old token is gone server-side too: me() answers unauthorized.
    let api = HttpApi::new(
        &base_url,
        None,
        Arc::clone(&tokens),
        Duration::from_secs(5),
    )
    .unwrap();
    let response = api.me().await.unwrap();
    assert_eq!(response.result_code, ResultCode::Error);
}

#[tokio::test]
async fn restore_session_reuses_a_persisted_token() {
    let (_state, base_url) = spawn_server().await;
    let (api, tokens, session) = make_client(&base_url);
    let mut flow = LoginFlow::new(api, Arc::clone(&tokens), session);
    flow.submit(free_attempt()).await.unwrap();

    // A new process: fresh session flags, same token store.
    let session = Arc::new(SessionState::new());
    let api = HttpApi::new(
        &base_url,
        None,
        Arc::clone(&tokens),
        Duration::from_secs(5),
    )
    .unwrap();
    let mut flow = LoginFlow::new(api, Arc::clone(&tokens), Arc::clone(&session));

    assert!(flow.restore_session().await.unwrap());
    assert!(session.is_logged_in());
}
