//! The response envelope shared by all mutating TodoTerm API endpoints.
//!
//! Every write endpoint answers with an [`ApiResponse`] carrying a numeric
//! [`ResultCode`] discriminator, human-readable messages, field-level errors,
//! and an operation-specific payload. Read endpoints that return bare
//! collections (e.g. the todolist listing) bypass the envelope.

use serde::{Deserialize, Serialize};

/// Numeric discriminator classifying a server response outcome.
///
/// Serialized as a bare JSON number. Codes the client does not know are
/// preserved in [`ResultCode::Unknown`] so they survive a round-trip and can
/// be logged verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i32", into = "i32")]
pub enum ResultCode {
    /// The operation succeeded.
    Success,
    /// The operation was rejected (bad credentials, missing entity, ...).
    Error,
    /// The server demands a captcha challenge before it will authenticate.
    CaptchaRequired,
    /// A code this client version does not recognize.
    Unknown(i32),
}

impl From<i32> for ResultCode {
    fn from(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::Error,
            10 => Self::CaptchaRequired,
            other => Self::Unknown(other),
        }
    }
}

impl From<ResultCode> for i32 {
    fn from(code: ResultCode) -> Self {
        match code {
            ResultCode::Success => 0,
            ResultCode::Error => 1,
            ResultCode::CaptchaRequired => 10,
            ResultCode::Unknown(other) => other,
        }
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Success => write!(f, "success"),
            Self::Error => write!(f, "error"),
            Self::CaptchaRequired => write!(f, "captcha required"),
            Self::Unknown(code) => write!(f, "unknown code {code}"),
        }
    }
}

/// A validation error attributed to a single request field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Name of the offending request field.
    pub field: String,
    /// What is wrong with it.
    pub error: String,
}

/// Envelope for mutating endpoint responses.
///
/// `data` is `None` (serialized as `null`) when the request failed; on
/// success it carries the operation payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct ApiResponse<T> {
    /// Outcome discriminator.
    pub result_code: ResultCode,
    /// Human-readable diagnostics (empty on success).
    #[serde(default)]
    pub messages: Vec<String>,
    /// Per-field validation errors (empty unless the request was malformed).
    #[serde(default)]
    pub fields_errors: Vec<FieldError>,
    /// Operation payload, present only on success.
    #[serde(default)]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Builds a success envelope around a payload.
    #[must_use]
    pub fn success(data: T) -> Self {
        Self {
            result_code: ResultCode::Success,
            messages: Vec::new(),
            fields_errors: Vec::new(),
            data: Some(data),
        }
    }

    /// Builds a failure envelope with a single message and no payload.
    #[must_use]
    pub fn error(code: ResultCode, message: impl Into<String>) -> Self {
        Self {
            result_code: code,
            messages: vec![message.into()],
            fields_errors: Vec::new(),
            data: None,
        }
    }

    /// Builds a failure envelope attributing the error to one field.
    #[must_use]
    pub fn field_error(field: impl Into<String>, error: impl Into<String>) -> Self {
        let error = error.into();
        Self {
            result_code: ResultCode::Error,
            messages: vec![error.clone()],
            fields_errors: vec![FieldError {
                field: field.into(),
                error,
            }],
            data: None,
        }
    }

    /// Whether the envelope carries [`ResultCode::Success`].
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.result_code == ResultCode::Success
    }
}

/// Payload of endpoints that return no data (delete, rename, logout).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}
