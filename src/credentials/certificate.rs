//! Client Certificates
//!
//! Loading application certificates and their RSA signing keys from PEM
//! bundles.

use base64::Engine;
use jsonwebtoken::EncodingKey;
use pkcs8::{EncryptedPrivateKeyInfo, ObjectIdentifier, PrivateKeyInfo};
use ring::digest::{digest, SHA1_FOR_LEGACY_USE_ONLY};

use crate::error::CredentialError;

const RSA_ENCRYPTION_OID: ObjectIdentifier = ObjectIdentifier::new_unwrap("1.2.840.113549.1.1.1");

const CERTIFICATE_TAG: &str = "CERTIFICATE";
const PKCS8_KEY_TAG: &str = "PRIVATE KEY";
const PKCS1_KEY_TAG: &str = "RSA PRIVATE KEY";
const ENCRYPTED_KEY_TAG: &str = "ENCRYPTED PRIVATE KEY";

/// Private key block found in a bundle.
#[derive(Clone)]
pub enum PrivateKeyBlock {
    /// PKCS#1 `RSA PRIVATE KEY`.
    Pkcs1(Vec<u8>),
    /// Unencrypted PKCS#8 `PRIVATE KEY`.
    Pkcs8(Vec<u8>),
    /// Password-protected PKCS#8 `ENCRYPTED PRIVATE KEY`.
    EncryptedPkcs8(Vec<u8>),
}

/// Certificate plus (optionally) its private key, as read from PEM.
#[derive(Clone)]
pub struct CertificateBundle {
    /// DER-encoded leaf certificate (first `CERTIFICATE` block).
    pub certificate_der: Vec<u8>,
    /// First private key block, if any.
    pub private_key: Option<PrivateKeyBlock>,
}

impl CertificateBundle {
    /// Parse a PEM bundle.
    pub fn from_pem(bytes: &[u8]) -> Result<Self, CredentialError> {
        let blocks = pem::parse_many(bytes).map_err(|e| CredentialError::InvalidCertificate {
            message: e.to_string(),
        })?;

        let mut certificate_der = None;
        let mut private_key = None;

        for block in blocks {
            let contents = block.contents().to_vec();
            match block.tag() {
                CERTIFICATE_TAG if certificate_der.is_none() => certificate_der = Some(contents),
                PKCS1_KEY_TAG if private_key.is_none() => {
                    private_key = Some(PrivateKeyBlock::Pkcs1(contents))
                }
                PKCS8_KEY_TAG if private_key.is_none() => {
                    private_key = Some(PrivateKeyBlock::Pkcs8(contents))
                }
                ENCRYPTED_KEY_TAG if private_key.is_none() => {
                    private_key = Some(PrivateKeyBlock::EncryptedPkcs8(contents))
                }
                _ => {}
            }
        }

        let certificate_der = certificate_der.ok_or_else(|| CredentialError::InvalidCertificate {
            message: "no CERTIFICATE block found".to_string(),
        })?;

        Ok(Self {
            certificate_der,
            private_key,
        })
    }

    /// Uppercase hex SHA-1 thumbprint of the certificate.
    pub fn thumbprint(&self) -> String {
        hex::encode_upper(sha1(&self.certificate_der))
    }
}

/// Application certificate credential used to sign client assertions.
///
/// The decoded signing key lives as long as this value, so a credential
/// built once can sign any number of assertions.
#[derive(Clone)]
pub struct ClientCertificate {
    client_id: String,
    certificate_der: Vec<u8>,
    sha1: Vec<u8>,
    key: EncodingKey,
}

impl ClientCertificate {
    /// Build from PEM bundle bytes, decrypting the key with `password` when
    /// it is encrypted.
    pub fn from_bytes(
        cert_bytes: &[u8],
        password: &str,
        client_id: impl Into<String>,
    ) -> Result<Self, CredentialError> {
        let bundle = CertificateBundle::from_pem(cert_bytes)?;
        Self::from_bundle(bundle, Some(password), client_id)
    }

    /// Build from an already-parsed bundle.
    pub fn from_bundle(
        bundle: CertificateBundle,
        password: Option<&str>,
        client_id: impl Into<String>,
    ) -> Result<Self, CredentialError> {
        let block = bundle
            .private_key
            .as_ref()
            .ok_or_else(|| CredentialError::InvalidPrivateKey {
                message: "certificate has no private key".to_string(),
            })?;

        let key = match block {
            PrivateKeyBlock::Pkcs1(der) => EncodingKey::from_rsa_der(der),
            PrivateKeyBlock::Pkcs8(der) => rsa_key_from_pkcs8(der)?,
            PrivateKeyBlock::EncryptedPkcs8(der) => {
                let password = password.ok_or_else(|| CredentialError::DecryptionFailed {
                    message: "private key is encrypted and no password was given".to_string(),
                })?;
                let info = EncryptedPrivateKeyInfo::try_from(der.as_slice()).map_err(|e| {
                    CredentialError::InvalidPrivateKey {
                        message: e.to_string(),
                    }
                })?;
                let document =
                    info.decrypt(password)
                        .map_err(|e| CredentialError::DecryptionFailed {
                            message: e.to_string(),
                        })?;
                rsa_key_from_pkcs8(document.as_bytes())?
            }
        };

        Ok(Self {
            client_id: client_id.into(),
            sha1: sha1(&bundle.certificate_der),
            certificate_der: bundle.certificate_der,
            key,
        })
    }

    /// Application (client) id the certificate is registered to.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// DER-encoded certificate.
    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }

    /// Uppercase hex SHA-1 thumbprint.
    pub fn thumbprint(&self) -> String {
        hex::encode_upper(&self.sha1)
    }

    /// base64url SHA-1 thumbprint, as carried in the JWT `x5t` header.
    pub fn x5t(&self) -> String {
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(&self.sha1)
    }

    pub(crate) fn signing_key(&self) -> &EncodingKey {
        &self.key
    }
}

impl std::fmt::Debug for ClientCertificate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientCertificate")
            .field("client_id", &self.client_id)
            .field("thumbprint", &self.thumbprint())
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Canonical thumbprint form: uppercase hex with separators removed.
///
/// Thumbprints copied from certificate dialogs often carry spaces, colons or
/// a leading left-to-right mark.
pub fn normalize_thumbprint(thumbprint: &str) -> String {
    thumbprint
        .chars()
        .filter(|c| c.is_ascii_hexdigit())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

fn sha1(data: &[u8]) -> Vec<u8> {
    digest(&SHA1_FOR_LEGACY_USE_ONLY, data).as_ref().to_vec()
}

fn rsa_key_from_pkcs8(der: &[u8]) -> Result<EncodingKey, CredentialError> {
    let info = PrivateKeyInfo::try_from(der).map_err(|e| CredentialError::InvalidPrivateKey {
        message: e.to_string(),
    })?;

    if info.algorithm.oid != RSA_ENCRYPTION_OID {
        return Err(CredentialError::InvalidPrivateKey {
            message: format!("unsupported key algorithm {}", info.algorithm.oid),
        });
    }

    Ok(EncodingKey::from_rsa_der(info.private_key))
}
