//! Captcha challenge payload.

use serde::{Deserialize, Serialize};

/// Payload of `GET security/get-captcha-url`: a displayable challenge image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptchaChallenge {
    /// URL of the challenge image the user must transcribe.
    pub url: String,
}
