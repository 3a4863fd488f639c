//! Login flow: a state machine over `Idle -> Submitting -> {Success,
//! CaptchaRequired}`, driven by the server's result code.
//!
//! From `CaptchaRequired`, resubmission returns to `Submitting`. Result
//! codes the flow does not recognize cause no transition and no persisted
//! side effect; they are logged at warn level (known gap in the upstream
//! protocol — see DESIGN.md).

use std::sync::Arc;

use todoterm_proto::auth::{LoginRequest, ValidationError};
use todoterm_proto::captcha::CaptchaChallenge;
use todoterm_proto::response::ResultCode;

use crate::api::TodoApi;

use super::session::{SessionState, TokenStore, AUTH_TOKEN};
use super::AuthError;

/// States of the login flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginState {
    /// No attempt in flight; awaiting (re)submission.
    Idle,
    /// An authentication request has been issued and not yet resolved.
    Submitting,
    /// Authentication succeeded; the token is persisted.
    Success,
    /// The server demands a captcha answer before it will authenticate.
    CaptchaRequired,
}

/// Account credentials entered into the login form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
    /// Whether the session should be long-lived.
    pub remember_me: bool,
}

/// One submission of the login form; consumed per attempt.
#[derive(Debug, Clone)]
pub struct LoginAttempt {
    /// The entered credentials.
    pub credentials: Credentials,
    /// The entered captcha answer, if the challenge was displayed.
    pub captcha: Option<String>,
}

/// Drives login attempts against the API and owns the transient attempt
/// state.
///
/// The flow is the sole writer of the [`SessionState`] flags and of the
/// [`AUTH_TOKEN`] entry in the token store. Credentials are retained across
/// a `CaptchaRequired` transition (the form is not reset); any entered
/// captcha text is not — it must be re-entered against the fresh challenge.
pub struct LoginFlow<A: TodoApi, S: TokenStore> {
    api: A,
    tokens: S,
    session: Arc<SessionState>,
    state: LoginState,
    saved: Option<Credentials>,
    challenge: Option<CaptchaChallenge>,
}

impl<A: TodoApi, S: TokenStore> LoginFlow<A, S> {
    /// Creates an idle flow.
    pub fn new(api: A, tokens: S, session: Arc<SessionState>) -> Self {
        Self {
            api,
            tokens,
            session,
            state: LoginState::Idle,
            saved: None,
            challenge: None,
        }
    }

    /// The current state of the flow.
    #[must_use]
    pub fn state(&self) -> LoginState {
        self.state
    }

    /// The most recently fetched captcha challenge, if any.
    #[must_use]
    pub fn challenge(&self) -> Option<&CaptchaChallenge> {
        self.challenge.as_ref()
    }

    /// Submits a login attempt.
    ///
    /// Sends exactly one authentication request. Returns the state the flow
    /// transitioned to; an unrecognized result code returns
    /// [`LoginState::Idle`] with no side effects.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] before any request is sent, or
    /// [`AuthError::Api`] / [`AuthError::TokenStore`] when the request or a
    /// success side effect fails.
    pub async fn submit(&mut self, attempt: LoginAttempt) -> Result<LoginState, AuthError> {
        let request = LoginRequest {
            email: attempt.credentials.email.clone(),
            password: attempt.credentials.password.clone(),
            remember_me: attempt.credentials.remember_me,
            captcha: attempt.captcha,
        };
        request.validate()?;
        if self.session.captcha_required()
            && request.captcha.as_deref().is_none_or(str::is_empty)
        {
            return Err(ValidationError::CaptchaEmpty.into());
        }

        self.state = LoginState::Submitting;
        let response = match self.api.login(&request).await {
            Ok(response) => response,
            Err(e) => {
                self.state = LoginState::Idle;
                return Err(e.into());
            }
        };

        let token = response.data.as_ref().and_then(|d| d.token.clone());
        match (response.result_code, token) {
            (ResultCode::Success, Some(token)) if !token.is_empty() => {
                if let Err(e) = self.tokens.put(AUTH_TOKEN, &token) {
                    self.state = LoginState::Idle;
                    return Err(e.into());
                }
                self.session.set_logged_in(true);
                self.saved = None;
                self.session.set_captcha_required(false);
                self.challenge = None;
                self.state = LoginState::Success;
                tracing::info!("login succeeded");
            }
            (ResultCode::CaptchaRequired, _) => {
                self.session.set_captcha_required(true);
                self.saved = Some(attempt.credentials);
                // Any previously fetched challenge is stale now.
                self.challenge = None;
                self.state = LoginState::CaptchaRequired;
                self.fetch_captcha().await?;
                tracing::info!("server demanded a captcha challenge");
            }
            (code, _) => {
                tracing::warn!(
                    %code,
                    messages = ?response.messages,
                    "unhandled login result code; no state change"
                );
                self.saved = Some(attempt.credentials);
                self.state = LoginState::Idle;
            }
        }

        Ok(self.state)
    }

    /// Resubmits the retained credentials with a captcha answer.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::NoPendingAttempt`] when no credentials were
    /// retained, otherwise behaves like [`submit`](Self::submit).
    pub async fn resubmit_with_captcha(
        &mut self,
        captcha: impl Into<String> + Send,
    ) -> Result<LoginState, AuthError> {
        let credentials = self.saved.clone().ok_or(AuthError::NoPendingAttempt)?;
        self.submit(LoginAttempt {
            credentials,
            captcha: Some(captcha.into()),
        })
        .await
    }

    /// Fetches a fresh captcha challenge.
    ///
    /// Skipped (returns `Ok(None)`) while the server has not demanded a
    /// captcha. Re-fetching invalidates the previously held challenge.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Api`] when the fetch fails.
    pub async fn fetch_captcha(&mut self) -> Result<Option<&CaptchaChallenge>, AuthError> {
        if !self.session.captcha_required() {
            return Ok(None);
        }
        let challenge = self.api.captcha_url().await?;
        tracing::debug!(url = %challenge.url, "fetched captcha challenge");
        self.challenge = Some(challenge);
        Ok(self.challenge.as_ref())
    }

    /// Logs out: invalidates the server session and clears local state.
    ///
    /// The local token and logged-in flag are cleared even when the server
    /// rejects the logout request.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Api`] when the request fails (local state is
    /// not cleared in that case), or [`AuthError::TokenStore`] when the
    /// token cannot be removed.
    pub async fn logout(&mut self) -> Result<(), AuthError> {
        let response = self.api.logout().await?;
        if !response.is_success() {
            tracing::warn!(
                code = %response.result_code,
                "server rejected logout; clearing local session anyway"
            );
        }
        self.tokens.remove(AUTH_TOKEN)?;
        self.session.set_logged_in(false);
        self.state = LoginState::Idle;
        Ok(())
    }

    /// Restores a previous session from a persisted token.
    ///
    /// Returns `false` without a request when no token is stored. A stored
    /// token the server no longer accepts is discarded.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Api`] or [`AuthError::TokenStore`] when the
    /// check cannot be performed.
    pub async fn restore_session(&mut self) -> Result<bool, AuthError> {
        if self.tokens.get(AUTH_TOKEN)?.is_none() {
            return Ok(false);
        }
        let response = self.api.me().await?;
        if response.is_success() {
            self.session.set_logged_in(true);
            self.state = LoginState::Success;
            Ok(true)
        } else {
            tracing::info!("stored token is no longer valid; discarding it");
            self.tokens.remove(AUTH_TOKEN)?;
            Ok(false)
        }
    }
}
