//! Result Types
//!
//! Outcomes of login and send operations, plus the token endpoint response.

use serde::Deserialize;
use std::collections::HashMap;

/// Status code reported for operational failures.
pub const FAILURE_STATUS: i32 = -1;

/// Outcome of a `login*` call.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginResult {
    access_token: String,
    success: bool,
    status_code: i32,
}

impl LoginResult {
    /// Result carrying `access_token`; blank tokens count as failure.
    pub fn new(access_token: impl Into<String>) -> Self {
        let access_token = access_token.into();
        let success = !access_token.trim().is_empty();
        Self {
            access_token,
            success,
            status_code: if success { 200 } else { FAILURE_STATUS },
        }
    }

    /// Failed login.
    pub fn failed() -> Self {
        Self::new(String::new())
    }

    /// Access token; empty on failure.
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Whether a non-blank token was issued.
    pub fn success(&self) -> bool {
        self.success
    }

    /// 200 on success, -1 otherwise.
    pub fn status_code(&self) -> i32 {
        self.status_code
    }
}

impl std::fmt::Debug for LoginResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginResult")
            .field("access_token", &"[REDACTED]")
            .field("success", &self.success)
            .field("status_code", &self.status_code)
            .finish()
    }
}

/// Outcome of a `send_email` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ApiResult {
    status_code: i32,
    success: bool,
}

impl ApiResult {
    /// Result for an HTTP status; 2xx and 3xx count as success.
    pub fn new(status_code: i32) -> Self {
        Self {
            status_code,
            success: (200..400).contains(&status_code),
        }
    }

    /// Failed send that never produced a response.
    pub fn failed() -> Self {
        Self::new(FAILURE_STATUS)
    }

    /// HTTP status, or -1 when no response was received.
    pub fn status_code(&self) -> i32 {
        self.status_code
    }

    /// Whether the status is in the 2xx or 3xx range.
    pub fn success(&self) -> bool {
        self.success
    }
}

/// Token response from the Azure AD token endpoint.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    pub access_token: String,
    /// Token type (usually "Bearer").
    #[serde(default = "default_token_type")]
    pub token_type: String,
    /// Resource the token was issued for.
    #[serde(default)]
    pub resource: Option<String>,
    /// Additional fields.
    #[serde(flatten)]
    pub extra: HashMap<String, serde_json::Value>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl TokenResponse {
    /// Bearer token response.
    pub fn bearer(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: default_token_type(),
            resource: None,
            extra: HashMap::new(),
        }
    }
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("resource", &self.resource)
            .finish()
    }
}
