//! Authentication payloads and pre-submit validation.
//!
//! [`LoginRequest`] is validated locally before it is ever serialized;
//! validation failures are attributed to a single form field and never
//! reach the network.

use serde::{Deserialize, Serialize};

/// Minimum accepted password length in characters.
pub const MIN_PASSWORD_LENGTH: usize = 3;

/// Body of `POST auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    /// Account email address.
    pub email: String,
    /// Account password.
    pub password: String,
    /// Whether the issued session should outlive the browser/CLI session.
    pub remember_me: bool,
    /// Captcha challenge answer, required once the server has demanded one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub captcha: Option<String>,
}

impl LoginRequest {
    /// Validates the request fields locally.
    ///
    /// # Errors
    ///
    /// Returns the first failing [`ValidationError`]; the request must not
    /// be submitted when validation fails.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.email.is_empty() {
            return Err(ValidationError::EmailEmpty);
        }
        if !self.email.contains('@') {
            return Err(ValidationError::EmailInvalid);
        }
        if self.password.is_empty() {
            return Err(ValidationError::PasswordEmpty);
        }
        if self.password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(ValidationError::PasswordTooShort);
        }
        Ok(())
    }
}

/// Payload of a successful `POST auth/login`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginData {
    /// Identifier of the authenticated user.
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Bearer token for subsequent requests.
    #[serde(default)]
    pub token: Option<String>,
}

/// Payload of `GET auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeData {
    /// Identifier of the authenticated user.
    pub id: i64,
    /// Account email address.
    pub email: String,
    /// Account login name.
    pub login: String,
}

/// Field-level login validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Email field is empty.
    #[error("email is required")]
    EmailEmpty,
    /// Email field does not look like an address.
    #[error("email must be a valid address")]
    EmailInvalid,
    /// Password field is empty.
    #[error("password is required")]
    PasswordEmpty,
    /// Password is shorter than [`MIN_PASSWORD_LENGTH`].
    #[error("password must be at least {MIN_PASSWORD_LENGTH} characters")]
    PasswordTooShort,
    /// A captcha answer is required but was not entered.
    #[error("captcha text is required")]
    CaptchaEmpty,
}

impl ValidationError {
    /// The form field this error should be surfaced next to.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::EmailEmpty | Self::EmailInvalid => "email",
            Self::PasswordEmpty | Self::PasswordTooShort => "password",
            Self::CaptchaEmpty => "captcha",
        }
    }
}
