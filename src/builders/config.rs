//! Options Builder
//!
//! Fluent builder for [`O365AuthenticationOptions`].

use secrecy::SecretString;

use crate::error::ConfigurationError;
use crate::types::O365AuthenticationOptions;

/// Builder for Office 365 authentication options.
#[derive(Default)]
pub struct O365OptionsBuilder {
    client_id: Option<String>,
    client_secret: Option<SecretString>,
    tenant_id: Option<String>,
    tenant_name: Option<String>,
    cert_bytes: Vec<u8>,
    cert_private_key: Option<SecretString>,
    cert_thumbprint: Option<String>,
    from_address: Option<String>,
}

impl O365OptionsBuilder {
    /// Create new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the application (client) id.
    pub fn client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = Some(client_id.into());
        self
    }

    /// Set the application secret.
    pub fn client_secret(mut self, client_secret: impl Into<String>) -> Self {
        self.client_secret = Some(SecretString::new(client_secret.into()));
        self
    }

    /// Set the tenant id.
    pub fn tenant_id(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_id = Some(tenant_id.into());
        self
    }

    /// Set the tenant name used for the authority.
    pub fn tenant_name(mut self, tenant_name: impl Into<String>) -> Self {
        self.tenant_name = Some(tenant_name.into());
        self
    }

    /// Set the PEM certificate bundle.
    pub fn cert_bytes(mut self, cert_bytes: impl Into<Vec<u8>>) -> Self {
        self.cert_bytes = cert_bytes.into();
        self
    }

    /// Set the private key password.
    pub fn cert_private_key(mut self, password: impl Into<String>) -> Self {
        self.cert_private_key = Some(SecretString::new(password.into()));
        self
    }

    /// Set the certificate store thumbprint.
    pub fn cert_thumbprint(mut self, thumbprint: impl Into<String>) -> Self {
        self.cert_thumbprint = Some(thumbprint.into());
        self
    }

    /// Set the sending mailbox.
    pub fn from_address(mut self, from_address: impl Into<String>) -> Self {
        self.from_address = Some(from_address.into());
        self
    }

    /// Build the options.
    pub fn build(self) -> Result<O365AuthenticationOptions, ConfigurationError> {
        let tenant_name = required(self.tenant_name, "tenant_name")?;
        let from_address = required(self.from_address, "from_address")?;

        if !from_address.contains('@') {
            return Err(ConfigurationError::InvalidConfig {
                message: format!("from_address '{}' is not a mailbox address", from_address),
            });
        }

        Ok(O365AuthenticationOptions {
            client_id: self.client_id.unwrap_or_default(),
            client_secret: self.client_secret,
            tenant_id: self.tenant_id.unwrap_or_default(),
            tenant_name,
            cert_bytes: self.cert_bytes,
            cert_private_key: self.cert_private_key,
            cert_thumbprint: self.cert_thumbprint,
            from_address,
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, ConfigurationError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigurationError::MissingField {
            field: field.to_string(),
        })
}

/// Create a new options builder.
pub fn o365_options() -> O365OptionsBuilder {
    O365OptionsBuilder::new()
}
