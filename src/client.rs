//! Office 365 Mail Client
//!
//! Logs in to Azure AD and sends mail through the Outlook REST API.

use chrono::Utc;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::core::{Backchannel, HttpRequest, HttpTransport, ReqwestHttpTransport};
use crate::credentials::{
    build_from_thumbprint, CertificateStore, ClientCertificate, Credential,
    FileCertificateStore,
};
use crate::error::{O365Error, O365Result, ProtocolError, ValidationError};
use crate::identity::{AzureAdIdentityProvider, IdentityProvider};
use crate::telemetry::{Logger, O365LogContext, TracingLogger};
use crate::types::{
    ApiResult, LoginResult, Message, O365AuthenticationOptions, SendMailPayload,
    MAIL_BASE_ADDRESS, MAIL_RESOURCE,
};

const USER_AGENT: &str = concat!("o365-mail/", env!("CARGO_PKG_VERSION"));

/// RFC 7231 IMF-fixdate.
const HTTP_DATE_FORMAT: &str = "%a, %d %b %Y %H:%M:%S GMT";

/// Office 365 mail client.
///
/// A client holds one access token. The last `login*` call to succeed
/// decides which token later sends use; failed logins leave it untouched.
pub struct O365Client<
    I: IdentityProvider = AzureAdIdentityProvider,
    T: HttpTransport = ReqwestHttpTransport,
> {
    options: O365AuthenticationOptions,
    identity: Arc<I>,
    backchannel: Backchannel<T>,
    certificate_store: Arc<dyn CertificateStore>,
    logger: Arc<dyn Logger>,
    access_token: RwLock<Option<SecretString>>,
}

impl O365Client<AzureAdIdentityProvider, ReqwestHttpTransport> {
    /// Create a client with the default transport, the current user's
    /// certificate store and `tracing` logging.
    pub fn new(options: O365AuthenticationOptions) -> O365Result<Self> {
        let transport = Arc::new(ReqwestHttpTransport::new()?);
        let identity = Arc::new(AzureAdIdentityProvider::with_transport(transport.clone()));
        let certificate_store = Arc::new(FileCertificateStore::current_user()?);

        Ok(Self::with_components(
            options,
            identity,
            transport,
            certificate_store,
            Arc::new(TracingLogger),
        ))
    }
}

impl<I: IdentityProvider, T: HttpTransport> O365Client<I, T> {
    /// Create a client from explicit components.
    pub fn with_components(
        options: O365AuthenticationOptions,
        identity: Arc<I>,
        transport: Arc<T>,
        certificate_store: Arc<dyn CertificateStore>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            options,
            identity,
            backchannel: Backchannel::new(transport, MAIL_BASE_ADDRESS),
            certificate_store,
            logger,
            access_token: RwLock::new(None),
        }
    }

    /// Options the client was built with.
    pub fn options(&self) -> &O365AuthenticationOptions {
        &self.options
    }

    /// Whether a login has succeeded on this client.
    pub async fn is_authenticated(&self) -> bool {
        self.current_token().await.is_some()
    }

    /// Log in with an application id and shared secret.
    ///
    /// Identity failures are logged and reported as a failed `LoginResult`;
    /// only argument errors are returned as `Err`.
    pub async fn login(
        &self,
        resource: &str,
        client_id: &str,
        client_secret: &str,
    ) -> O365Result<LoginResult> {
        require("resource", resource)?;
        require("client_id", client_id)?;
        require("client_secret", client_secret)?;

        let credential = Credential::client_secret(client_id, client_secret);
        Ok(self.authenticate("login", resource, credential).await)
    }

    /// Log in with a certificate bundle and the password for its private key.
    pub async fn login_with_certificate_bytes(
        &self,
        resource: &str,
        cert_bytes: &[u8],
        password: &str,
        client_id: &str,
    ) -> O365Result<LoginResult> {
        require("resource", resource)?;
        if cert_bytes.is_empty() {
            return Err(ValidationError::missing("cert_bytes").into());
        }
        require("password", password)?;

        let certificate = ClientCertificate::from_bytes(cert_bytes, password, client_id)?;
        Ok(self
            .authenticate(
                "login_with_certificate_bytes",
                resource,
                Credential::Certificate(certificate),
            )
            .await)
    }

    /// Log in with a certificate from the certificate store.
    ///
    /// An encrypted key in the store is unlocked with the configured
    /// `cert_private_key`. A thumbprint that matches nothing in the store is
    /// returned as `ConfigurationError::CertificateNotFound`.
    pub async fn login_with_thumbprint(
        &self,
        resource: &str,
        client_id: &str,
        thumbprint: &str,
    ) -> O365Result<LoginResult> {
        require("resource", resource)?;
        require("client_id", client_id)?;
        require("thumbprint", thumbprint)?;

        let certificate = build_from_thumbprint(
            self.certificate_store.clone(),
            thumbprint,
            client_id,
            self.configured_key_password(),
        )
        .await?;
        Ok(self
            .authenticate(
                "login_with_thumbprint",
                resource,
                Credential::Certificate(certificate),
            )
            .await)
    }

    /// Log in for sending mail using the configured certificate.
    ///
    /// A configured thumbprint takes precedence over certificate bytes.
    pub async fn initialize_for_app_mail(&self) -> O365Result<LoginResult> {
        let options = &self.options;

        match options.cert_thumbprint.as_deref() {
            Some(thumbprint) if options.has_thumbprint() => {
                self.login_with_thumbprint(MAIL_RESOURCE, &options.client_id, thumbprint)
                    .await
            }
            _ => {
                let password = self.configured_key_password().unwrap_or_default();
                self.login_with_certificate_bytes(
                    MAIL_RESOURCE,
                    &options.cert_bytes,
                    password,
                    &options.client_id,
                )
                .await
            }
        }
    }

    /// Send `message` from the configured mailbox.
    ///
    /// Returns `Err` for missing login or an invalid message, before any
    /// request is made. Transport failures and cancellation are logged and
    /// reported as `ApiResult` with status -1.
    pub async fn send_email(
        &self,
        message: &Message,
        save_to_sent: bool,
        cancel: Option<&CancellationToken>,
    ) -> O365Result<ApiResult> {
        let token = self
            .current_token()
            .await
            .ok_or(ValidationError::NotAuthenticated)?;
        validate_message(message)?;

        let payload = serde_json::to_string(&SendMailPayload::new(message, save_to_sent))
            .map_err(|e| {
                O365Error::Protocol(ProtocolError::InvalidJson {
                    message: e.to_string(),
                })
            })?;

        let request_id = uuid::Uuid::new_v4().to_string();
        let context = O365LogContext::new()
            .operation("send_email")
            .client_id(&self.options.client_id)
            .request_id(&request_id);

        let request = HttpRequest::post(format!("{}/sendmail", self.options.mailbox_path()))
            .header("authorization", format!("Bearer {}", token.expose_secret()))
            .header("user-agent", USER_AGENT)
            .header("client-request-id", &request_id)
            .header("date", Utc::now().format(HTTP_DATE_FORMAT).to_string())
            .header("content-type", "application/json; charset=utf-8")
            .body(payload);

        self.logger.debug("Sending message", &context);

        let outcome = match cancel {
            Some(cancel) if cancel.is_cancelled() => None,
            Some(cancel) => tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.backchannel.send(request) => Some(result),
            },
            None => Some(self.backchannel.send(request).await),
        };

        let result = match outcome {
            None => {
                self.logger.warn("Send cancelled", &context);
                ApiResult::failed()
            }
            Some(Err(e)) => {
                self.logger
                    .error("Failed to send the message", &context.error(&e));
                ApiResult::failed()
            }
            Some(Ok(response)) => {
                let result = ApiResult::new(i32::from(response.status));
                let context = context.extra("status", response.status.to_string());
                if result.success() {
                    self.logger.info("Message sent", &context);
                } else {
                    self.logger.warn("Mail service rejected the message", &context);
                }
                result
            }
        };

        Ok(result)
    }

    fn configured_key_password(&self) -> Option<&str> {
        self.options
            .cert_private_key
            .as_ref()
            .map(|p| p.expose_secret().as_str())
    }

    async fn current_token(&self) -> Option<SecretString> {
        self.access_token
            .read()
            .await
            .as_ref()
            .filter(|t| !t.expose_secret().is_empty())
            .cloned()
    }

    async fn authenticate(
        &self,
        operation: &str,
        resource: &str,
        credential: Credential,
    ) -> LoginResult {
        let context = O365LogContext::new()
            .operation(operation)
            .client_id(credential.client_id())
            .extra("resource", resource)
            .extra("credential", credential.kind());

        self.logger.debug("Requesting access token", &context);

        let authority = self.options.authority_url();
        let token = match self
            .identity
            .acquire_token(&authority, resource, &credential)
            .await
        {
            Ok(token) => token,
            Err(e) => {
                self.logger
                    .error("Failed to acquire access token", &context.error(&e));
                return LoginResult::failed();
            }
        };

        let result = LoginResult::new(token.access_token);
        if result.success() {
            *self.access_token.write().await =
                Some(SecretString::new(result.access_token().to_string()));
            self.logger.info("Access token acquired", &context);
        } else {
            self.logger.error(
                "Failed to acquire access token",
                &context.error("identity provider returned an empty access token"),
            );
        }
        result
    }
}

fn require(name: &str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::missing(name));
    }
    Ok(())
}

fn validate_message(message: &Message) -> Result<(), ValidationError> {
    require("subject", &message.subject)?;
    require("body", &message.body)?;

    if message.to_recipients.is_empty() {
        return Err(ValidationError::InvalidRecipients {
            message: "no recipients".to_string(),
        });
    }
    if let Some(index) = message
        .to_recipients
        .iter()
        .position(|r| r.email_address.is_empty())
    {
        return Err(ValidationError::InvalidRecipients {
            message: format!("invalid recipient address at position {}", index),
        });
    }
    Ok(())
}
