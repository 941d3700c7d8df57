//! Identity Provider
//!
//! Token acquisition against Azure AD using the client credentials grant.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::core::{HttpRequest, HttpTransport, ReqwestHttpTransport};
use crate::credentials::{ClientAssertion, Credential, JWT_BEARER_ASSERTION_TYPE};
use crate::error::{create_error_from_response, O365Error, O365Result, ProtocolError};
use crate::types::TokenResponse;

/// Identity provider interface (for dependency injection).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Acquire an access token for `resource` from `authority`.
    async fn acquire_token(
        &self,
        authority: &str,
        resource: &str,
        credential: &Credential,
    ) -> O365Result<TokenResponse>;
}

/// Azure AD (v1 endpoint) identity provider.
pub struct AzureAdIdentityProvider<T: HttpTransport = ReqwestHttpTransport> {
    transport: Arc<T>,
}

impl AzureAdIdentityProvider<ReqwestHttpTransport> {
    /// Create a provider with the default transport.
    pub fn new() -> O365Result<Self> {
        Ok(Self::with_transport(Arc::new(ReqwestHttpTransport::new()?)))
    }
}

impl<T: HttpTransport> AzureAdIdentityProvider<T> {
    /// Create a provider over a custom transport.
    pub fn with_transport(transport: Arc<T>) -> Self {
        Self { transport }
    }

    /// Token endpoint for an authority.
    pub fn token_endpoint(authority: &str) -> String {
        format!("{}/oauth2/token", authority.trim_end_matches('/'))
    }

    fn build_request_body(
        &self,
        token_endpoint: &str,
        resource: &str,
        credential: &Credential,
    ) -> O365Result<String> {
        let mut form = url::form_urlencoded::Serializer::new(String::new());
        form.append_pair("grant_type", "client_credentials")
            .append_pair("client_id", credential.client_id())
            .append_pair("resource", resource);

        match credential {
            Credential::ClientSecret { client_secret, .. } => {
                form.append_pair("client_secret", client_secret.expose_secret());
            }
            Credential::Certificate(certificate) => {
                let assertion = ClientAssertion::sign(certificate, token_endpoint)?;
                form.append_pair("client_assertion_type", JWT_BEARER_ASSERTION_TYPE)
                    .append_pair("client_assertion", &assertion);
            }
        }

        Ok(form.finish())
    }
}

#[async_trait]
impl<T: HttpTransport> IdentityProvider for AzureAdIdentityProvider<T> {
    async fn acquire_token(
        &self,
        authority: &str,
        resource: &str,
        credential: &Credential,
    ) -> O365Result<TokenResponse> {
        let token_endpoint = Self::token_endpoint(authority);
        let body = self.build_request_body(&token_endpoint, resource, credential)?;

        let request = HttpRequest::post(token_endpoint)
            .header("content-type", "application/x-www-form-urlencoded")
            .header("accept", "application/json")
            .body(body);

        let response = self.transport.send(request).await?;

        if response.status != 200 {
            return Err(create_error_from_response(response.status, &response.body));
        }

        let token_response: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
            O365Error::Protocol(ProtocolError::InvalidJson {
                message: e.to_string(),
            })
        })?;

        if token_response.access_token.is_empty() {
            return Err(O365Error::Protocol(ProtocolError::MissingField {
                field: "access_token".to_string(),
            }));
        }

        Ok(token_response)
    }
}

/// Recorded `acquire_token` call.
#[derive(Debug, Clone)]
pub struct TokenRequestRecord {
    pub authority: String,
    pub resource: String,
    pub client_id: String,
    pub credential_kind: &'static str,
}

/// Mock identity provider for testing.
///
/// Queued outcomes are returned in FIFO order; with an empty queue every
/// call succeeds with `mock-access-token`.
#[derive(Default)]
pub struct MockIdentityProvider {
    outcomes: Mutex<VecDeque<O365Result<TokenResponse>>>,
    request_history: Mutex<Vec<TokenRequestRecord>>,
}

impl MockIdentityProvider {
    /// Create new mock provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a successful token.
    pub fn queue_token(&self, access_token: impl Into<String>) -> &Self {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(Ok(TokenResponse::bearer(access_token)));
        self
    }

    /// Queue a failure.
    pub fn queue_error(&self, error: O365Error) -> &Self {
        self.outcomes.lock().unwrap().push_back(Err(error));
        self
    }

    /// Get request history.
    pub fn get_requests(&self) -> Vec<TokenRequestRecord> {
        self.request_history.lock().unwrap().clone()
    }

    /// Number of token requests made.
    pub fn request_count(&self) -> usize {
        self.request_history.lock().unwrap().len()
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn acquire_token(
        &self,
        authority: &str,
        resource: &str,
        credential: &Credential,
    ) -> O365Result<TokenResponse> {
        self.request_history.lock().unwrap().push(TokenRequestRecord {
            authority: authority.to_string(),
            resource: resource.to_string(),
            client_id: credential.client_id().to_string(),
            credential_kind: credential.kind(),
        });

        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(TokenResponse::bearer("mock-access-token")))
    }
}
