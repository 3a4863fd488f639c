//! Authentication: session flags, token persistence, and the login flow.

pub mod login;
pub mod session;

pub use login::{Credentials, LoginAttempt, LoginFlow, LoginState};
pub use session::{
    FileTokenStore, MemoryTokenStore, SessionState, TokenStore, TokenStoreError, AUTH_TOKEN,
};

use todoterm_proto::auth::ValidationError;

use crate::api::ApiError;

/// Errors that can occur during authentication operations.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The request never completed.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// A form field failed local validation; nothing was sent.
    #[error("{0}")]
    Validation(#[from] ValidationError),

    /// The token store could not be read or written.
    #[error("token store error: {0}")]
    TokenStore(#[from] TokenStoreError),

    /// `resubmit_with_captcha` was called without a retained attempt.
    #[error("no pending login attempt to resubmit")]
    NoPendingAttempt,
}
