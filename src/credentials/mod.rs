//! Credentials
//!
//! Credential forms presented to the identity provider, and the builders
//! that produce them.

pub mod assertion;
pub mod certificate;
pub mod store;

pub use assertion::*;
pub use certificate::*;
pub use store::*;

use secrecy::SecretString;
use std::sync::Arc;

use crate::error::{ConfigurationError, O365Result};

/// Credential presented when requesting a token.
#[derive(Clone)]
pub enum Credential {
    /// Application id and shared secret.
    ClientSecret {
        client_id: String,
        client_secret: SecretString,
    },
    /// Certificate used to sign a client assertion.
    Certificate(ClientCertificate),
}

impl Credential {
    /// Shared-secret credential.
    pub fn client_secret(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self::ClientSecret {
            client_id: client_id.into(),
            client_secret: SecretString::new(client_secret.into()),
        }
    }

    /// Application id the credential identifies.
    pub fn client_id(&self) -> &str {
        match self {
            Self::ClientSecret { client_id, .. } => client_id,
            Self::Certificate(cert) => cert.client_id(),
        }
    }

    /// Short name of the credential kind, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ClientSecret { .. } => "client_secret",
            Self::Certificate(_) => "certificate",
        }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ClientSecret { client_id, .. } => f
                .debug_struct("ClientSecret")
                .field("client_id", client_id)
                .field("client_secret", &"[REDACTED]")
                .finish(),
            Self::Certificate(cert) => f.debug_tuple("Certificate").field(cert).finish(),
        }
    }
}

/// Resolve a certificate credential from `store` by thumbprint.
///
/// The store is scanned on the blocking pool. `password` unlocks an
/// `ENCRYPTED PRIVATE KEY` held in the store; plain keys ignore it. A
/// thumbprint with no match is a configuration error; it is never retried.
pub async fn build_from_thumbprint(
    store: Arc<dyn CertificateStore>,
    thumbprint: &str,
    client_id: &str,
    password: Option<&str>,
) -> O365Result<ClientCertificate> {
    let lookup = thumbprint.to_string();
    let bundle = tokio::task::spawn_blocking(move || store.find_by_thumbprint(&lookup))
        .await
        .map_err(|e| ConfigurationError::StoreUnavailable {
            message: e.to_string(),
        })??
        .ok_or_else(|| ConfigurationError::CertificateNotFound {
            thumbprint: thumbprint.to_string(),
        })?;

    Ok(ClientCertificate::from_bundle(bundle, password, client_id)?)
}
