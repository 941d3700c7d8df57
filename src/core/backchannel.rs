//! Backchannel
//!
//! Transport session bound to a fixed base address and timeout.

use std::sync::Arc;
use std::time::Duration;
use url::Url;

use crate::core::transport::{HttpRequest, HttpResponse, HttpTransport, DEFAULT_TIMEOUT};
use crate::error::{NetworkError, O365Error, O365Result};

/// HTTP session against a single service root.
///
/// Requests carry a path relative to the base address. The base address is
/// only parsed when a request is sent, so a bad address surfaces as a send
/// failure.
pub struct Backchannel<T: HttpTransport> {
    transport: Arc<T>,
    base_address: String,
    timeout: Duration,
}

impl<T: HttpTransport> Backchannel<T> {
    /// Create a backchannel with the default 30 second timeout.
    pub fn new(transport: Arc<T>, base_address: impl Into<String>) -> Self {
        Self::with_timeout(transport, base_address, DEFAULT_TIMEOUT)
    }

    /// Create a backchannel with a custom timeout.
    pub fn with_timeout(
        transport: Arc<T>,
        base_address: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            transport,
            base_address: base_address.into(),
            timeout,
        }
    }

    /// Base address requests are resolved against.
    pub fn base_address(&self) -> &str {
        &self.base_address
    }

    /// Timeout applied to every request.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Underlying transport.
    pub fn transport(&self) -> &Arc<T> {
        &self.transport
    }

    /// Resolve `path` against the base address.
    pub fn resolve(&self, path: &str) -> O365Result<String> {
        let invalid = || {
            O365Error::Network(NetworkError::InvalidUrl {
                url: format!("{}{}", self.base_address, path),
            })
        };

        let base = Url::parse(&self.base_address).map_err(|_| invalid())?;
        let url = base.join(path).map_err(|_| invalid())?;
        Ok(url.to_string())
    }

    /// Send a request whose `url` holds a path relative to the base address.
    pub async fn send(&self, mut request: HttpRequest) -> O365Result<HttpResponse> {
        request.url = self.resolve(&request.url)?;
        request.timeout = Some(self.timeout);
        self.transport.send(request).await
    }
}
