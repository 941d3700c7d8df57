//! Error Types
//!
//! Error hierarchy for the Office 365 mail client.
//!
//! Errors fall into two groups. Validation, configuration and credential
//! errors are returned to the caller before any network attempt. Network,
//! protocol and provider errors are produced by the identity and transport
//! capabilities; the client logs them and folds them into failure results.

use std::time::Duration;
use thiserror::Error;

/// Root error type for the Office 365 mail client.
#[derive(Error, Debug)]
pub enum O365Error {
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Credential error: {0}")]
    Credential(#[from] CredentialError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

impl O365Error {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "O365_VALIDATION",
            Self::Configuration(_) => "O365_CONFIG",
            Self::Credential(_) => "O365_CREDENTIAL",
            Self::Network(_) => "O365_NETWORK",
            Self::Protocol(_) => "O365_PROTOCOL",
            Self::Provider(_) => "O365_PROVIDER",
        }
    }

    /// Check if the error is caused by the caller rather than a remote party.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Configuration(_) | Self::Credential(_)
        )
    }
}

/// Argument and precondition failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required argument: {name}")]
    MissingArgument { name: String },

    #[error("You must login before sending email")]
    NotAuthenticated,

    #[error("Invalid recipients: {message}")]
    InvalidRecipients { message: String },
}

impl ValidationError {
    pub(crate) fn missing(name: &str) -> Self {
        Self::MissingArgument {
            name: name.to_string(),
        }
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Environment error: {message}")]
    Environment { message: String },

    #[error("Unable to find certificate for thumbprint {thumbprint}")]
    CertificateNotFound { thumbprint: String },

    #[error("Certificate store unavailable: {message}")]
    StoreUnavailable { message: String },
}

/// Certificate and key material error.
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("Invalid certificate: {message}")]
    InvalidCertificate { message: String },

    #[error("Invalid private key: {message}")]
    InvalidPrivateKey { message: String },

    #[error("Private key decryption failed: {message}")]
    DecryptionFailed { message: String },

    #[error("Client assertion signing failed: {message}")]
    SigningFailed { message: String },
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("Invalid request URL: {url}")]
    InvalidUrl { url: String },

    #[error("Transport initialization failed: {message}")]
    ClientInit { message: String },
}

/// Protocol/response parsing error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },
}

/// Identity provider (Azure AD) error.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Invalid client: {}", .error_description.as_deref().unwrap_or("invalid client credentials"))]
    InvalidClient { error_description: Option<String> },

    #[error("Invalid grant: {message}")]
    InvalidGrant { message: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("Invalid resource: {message}")]
    InvalidResource { message: String },

    #[error("Unauthorized client: {}", .error_description.as_deref().unwrap_or("not allowed to use this grant type"))]
    UnauthorizedClient { error_description: Option<String> },

    #[error("Server error: {message}")]
    ServerError { message: String },

    #[error("Server temporarily unavailable")]
    TemporarilyUnavailable,
}

/// Result type for Office 365 operations.
pub type O365Result<T> = Result<T, O365Error>;

/// Error body returned by the Azure AD token endpoint.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct TokenErrorResponse {
    pub error: String,
    #[serde(default)]
    pub error_description: Option<String>,
    #[serde(default)]
    pub error_codes: Vec<i64>,
    #[serde(default)]
    pub correlation_id: Option<String>,
}

/// Map token endpoint error response to error type.
pub fn map_token_error(response: &TokenErrorResponse) -> ProviderError {
    let description = || {
        response
            .error_description
            .clone()
            .unwrap_or_else(|| response.error.clone())
    };

    match response.error.as_str() {
        "invalid_client" => ProviderError::InvalidClient {
            error_description: response.error_description.clone(),
        },
        "invalid_grant" => ProviderError::InvalidGrant {
            message: description(),
        },
        "invalid_resource" => ProviderError::InvalidResource {
            message: description(),
        },
        "unauthorized_client" => ProviderError::UnauthorizedClient {
            error_description: response.error_description.clone(),
        },
        "server_error" => ProviderError::ServerError {
            message: description(),
        },
        "temporarily_unavailable" => ProviderError::TemporarilyUnavailable,
        _ => ProviderError::InvalidRequest {
            message: description(),
        },
    }
}

/// Parse error response from HTTP body.
pub fn parse_error_response(body: &str) -> Option<TokenErrorResponse> {
    serde_json::from_str(body).ok()
}

/// Create error from a non-success token endpoint response.
pub fn create_error_from_response(status: u16, body: &str) -> O365Error {
    if let Some(response) = parse_error_response(body) {
        return O365Error::Provider(map_token_error(&response));
    }

    let error = match status {
        400 => ProviderError::InvalidRequest {
            message: "Bad request".to_string(),
        },
        401 => ProviderError::InvalidClient {
            error_description: Some("Unauthorized".to_string()),
        },
        403 => ProviderError::UnauthorizedClient {
            error_description: Some("Forbidden".to_string()),
        },
        503 => ProviderError::TemporarilyUnavailable,
        _ => ProviderError::ServerError {
            message: format!("HTTP {}", status),
        },
    };

    O365Error::Provider(error)
}
