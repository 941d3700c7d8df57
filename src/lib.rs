//! Office 365 Mail Client
//!
//! Application (daemon) mail sending through Office 365.
//!
//! # Features
//!
//! - Azure AD client credentials login with a shared secret
//! - Certificate login from a PEM bundle with an encrypted or plain key
//! - Certificate login by thumbprint from the current user's certificate store
//! - Sending HTML mail through the Outlook REST `sendmail` endpoint
//! - Cancellable sends with per-request correlation ids
//!
//! # Example
//!
//! ```rust,ignore
//! use o365_mail::{o365_options, MessageBuilder, O365Client};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = o365_options()
//!         .client_id("00000000-0000-0000-0000-000000000000")
//!         .tenant_name("contoso.onmicrosoft.com")
//!         .cert_thumbprint("DC222883B1A93330595B62E182A77B930DFF33DD")
//!         .from_address("noreply@contoso.com")
//!         .build()?;
//!
//!     let client = O365Client::new(options)?;
//!     let login = client.initialize_for_app_mail().await?;
//!     if !login.success() {
//!         return Err("login failed".into());
//!     }
//!
//!     let message = MessageBuilder::new()
//!         .subject("Report ready")
//!         .html("<p>The nightly report is ready.</p>")
//!         .to("ops@contoso.com")
//!         .build();
//!
//!     let result = client.send_email(&message, true, None).await?;
//!     println!("sendmail returned {}", result.status_code());
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `types`: options, messages and result types
//! - `error`: error hierarchy and Azure AD error mapping
//! - `core`: HTTP transport and the base-address-bound backchannel
//! - `credentials`: certificates, the certificate store and client assertions
//! - `identity`: token acquisition from Azure AD
//! - `builders`: fluent builders for options and messages
//! - `telemetry`: structured logging
//! - `client`: the mail client tying it together

pub mod builders;
pub mod client;
pub mod core;
pub mod credentials;
pub mod error;
pub mod identity;
pub mod telemetry;
pub mod types;

// Re-export main client
pub use client::O365Client;

// Re-export builders
pub use builders::{o365_options, MessageBuilder, O365OptionsBuilder};

// Re-export errors
pub use error::{
    create_error_from_response, map_token_error, parse_error_response, ConfigurationError,
    CredentialError, NetworkError, O365Error, O365Result, ProtocolError, ProviderError,
    TokenErrorResponse, ValidationError,
};

// Re-export types
pub use types::{
    ApiResult, LoginResult, Message, O365AuthenticationOptions, Recipient, SendMailPayload,
    TokenResponse, AUTHORITY_HOST, MAIL_BASE_ADDRESS, MAIL_RESOURCE,
};

// Re-export core components
pub use crate::core::{
    Backchannel, HttpMethod, HttpRequest, HttpResponse, HttpTransport, MockHttpTransport,
    ReqwestHttpTransport,
};

// Re-export credentials
pub use credentials::{
    build_from_thumbprint, CertificateBundle, CertificateStore, ClientAssertion,
    ClientCertificate, Credential, FileCertificateStore, InMemoryCertificateStore,
};

// Re-export identity
pub use identity::{AzureAdIdentityProvider, IdentityProvider, MockIdentityProvider};

// Re-export telemetry
pub use telemetry::{
    InMemoryLogger, LogEntry, LogLevel, Logger, NoOpLogger, O365LogContext, TracingLogger,
};

// Cancellation token accepted by `O365Client::send_email`.
pub use tokio_util::sync::CancellationToken;
