//! Client Assertions
//!
//! RS256 JWT client assertions for certificate-based Azure AD login.

use chrono::Utc;
use jsonwebtoken::{encode, Algorithm, Header};
use serde::{Deserialize, Serialize};

use crate::credentials::certificate::ClientCertificate;
use crate::error::CredentialError;

/// `client_assertion_type` for JWT bearer assertions.
pub const JWT_BEARER_ASSERTION_TYPE: &str =
    "urn:ietf:params:oauth:client-assertion-type:jwt-bearer";

/// Assertion lifetime in seconds.
pub const ASSERTION_LIFETIME_SECS: i64 = 600;

/// Claims carried by a client assertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssertionClaims {
    pub aud: String,
    pub iss: String,
    pub sub: String,
    pub jti: String,
    pub nbf: i64,
    pub exp: i64,
}

/// Signed client assertion.
pub struct ClientAssertion;

impl ClientAssertion {
    /// Sign an assertion for `audience` (the token endpoint).
    pub fn sign(certificate: &ClientCertificate, audience: &str) -> Result<String, CredentialError> {
        let now = Utc::now().timestamp();
        let claims = AssertionClaims {
            aud: audience.to_string(),
            iss: certificate.client_id().to_string(),
            sub: certificate.client_id().to_string(),
            jti: uuid::Uuid::new_v4().to_string(),
            nbf: now,
            exp: now + ASSERTION_LIFETIME_SECS,
        };

        let mut header = Header::new(Algorithm::RS256);
        header.x5t = Some(certificate.x5t());

        encode(&header, &claims, certificate.signing_key()).map_err(|e| {
            CredentialError::SigningFailed {
                message: e.to_string(),
            }
        })
    }
}
