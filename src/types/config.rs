//! Configuration Types
//!
//! Azure AD application and mailbox configuration.

use base64::Engine;
use secrecy::SecretString;
use serde::Deserialize;
use std::path::PathBuf;

use crate::error::ConfigurationError;

/// Azure AD authority host.
pub const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Outlook REST resource the mail token is scoped to.
pub const MAIL_RESOURCE: &str = "https://outlook.office.com";

/// Outlook REST service root.
pub const MAIL_BASE_ADDRESS: &str = "https://outlook.office.com";

/// Users collection path on the Outlook REST API.
pub const USERS_API_PATH: &str = "/api/v2.0/users/";

/// Environment variable names.
pub const O365_CLIENT_ID: &str = "O365_CLIENT_ID";
pub const O365_CLIENT_SECRET: &str = "O365_CLIENT_SECRET";
pub const O365_TENANT_ID: &str = "O365_TENANT_ID";
pub const O365_TENANT_NAME: &str = "O365_TENANT_NAME";
pub const O365_CERT_BYTES: &str = "O365_CERT_BYTES";
pub const O365_CERT_PATH: &str = "O365_CERT_PATH";
pub const O365_CERT_PRIVATE_KEY: &str = "O365_CERT_PRIVATE_KEY";
pub const O365_CERT_THUMBPRINT: &str = "O365_CERT_THUMBPRINT";
pub const O365_FROM_ADDRESS: &str = "O365_FROM_ADDRESS";

/// Office 365 authentication options.
///
/// Immutable once handed to a client. `from_address` selects the mailbox
/// every send goes through.
#[derive(Clone, Default, Deserialize)]
#[serde(default)]
pub struct O365AuthenticationOptions {
    /// Azure AD application (client) id.
    pub client_id: String,
    /// Application secret for shared-secret login.
    pub client_secret: Option<SecretString>,
    /// Directory (tenant) id.
    pub tenant_id: String,
    /// Tenant name used to build the authority, e.g. `contoso.onmicrosoft.com`.
    pub tenant_name: String,
    /// PEM bundle with the application certificate and its private key.
    pub cert_bytes: Vec<u8>,
    /// Password protecting the certificate's private key.
    pub cert_private_key: Option<SecretString>,
    /// SHA-1 thumbprint of a certificate in the user's certificate store.
    pub cert_thumbprint: Option<String>,
    /// Mailbox the client sends as.
    pub from_address: String,
}

impl O365AuthenticationOptions {
    /// Create a configuration builder.
    pub fn builder() -> crate::builders::O365OptionsBuilder {
        crate::builders::O365OptionsBuilder::new()
    }

    /// Create options from `O365_*` environment variables.
    ///
    /// Certificate bytes come from `O365_CERT_BYTES` (base64) or, failing
    /// that, from the file named by `O365_CERT_PATH`.
    pub fn from_env() -> Result<Self, ConfigurationError> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());

        let cert_bytes = match (var(O365_CERT_BYTES), var(O365_CERT_PATH)) {
            (Some(encoded), _) => base64::engine::general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| ConfigurationError::Environment {
                    message: format!("{} is not valid base64: {}", O365_CERT_BYTES, e),
                })?,
            (None, Some(path)) => {
                let path = PathBuf::from(path);
                std::fs::read(&path).map_err(|e| ConfigurationError::Environment {
                    message: format!("cannot read {}: {}", path.display(), e),
                })?
            }
            (None, None) => Vec::new(),
        };

        let mut builder = Self::builder()
            .client_id(var(O365_CLIENT_ID).unwrap_or_default())
            .tenant_id(var(O365_TENANT_ID).unwrap_or_default())
            .tenant_name(var(O365_TENANT_NAME).ok_or_else(|| {
                ConfigurationError::Environment {
                    message: format!("{} must be set", O365_TENANT_NAME),
                }
            })?)
            .from_address(var(O365_FROM_ADDRESS).ok_or_else(|| {
                ConfigurationError::Environment {
                    message: format!("{} must be set", O365_FROM_ADDRESS),
                }
            })?)
            .cert_bytes(cert_bytes);

        if let Some(secret) = var(O365_CLIENT_SECRET) {
            builder = builder.client_secret(secret);
        }
        if let Some(password) = var(O365_CERT_PRIVATE_KEY) {
            builder = builder.cert_private_key(password);
        }
        if let Some(thumbprint) = var(O365_CERT_THUMBPRINT) {
            builder = builder.cert_thumbprint(thumbprint);
        }

        builder.build()
    }

    /// Authority URL for this tenant.
    pub fn authority_url(&self) -> String {
        format!("{}/{}", AUTHORITY_HOST, self.tenant_name)
    }

    /// Mailbox path relative to the mail service root.
    pub fn mailbox_path(&self) -> String {
        format!("{}{}", USERS_API_PATH, self.from_address)
    }

    /// Whether thumbprint login is configured.
    pub fn has_thumbprint(&self) -> bool {
        self.cert_thumbprint
            .as_deref()
            .map_or(false, |t| !t.trim().is_empty())
    }
}

impl std::fmt::Debug for O365AuthenticationOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("O365AuthenticationOptions")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("tenant_id", &self.tenant_id)
            .field("tenant_name", &self.tenant_name)
            .field("cert_bytes", &format_args!("[{} bytes]", self.cert_bytes.len()))
            .field("cert_private_key", &"[REDACTED]")
            .field("cert_thumbprint", &self.cert_thumbprint)
            .field("from_address", &self.from_address)
            .finish()
    }
}
