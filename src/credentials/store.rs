//! Certificate Store
//!
//! Read-only lookup of application certificates by thumbprint.

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::credentials::certificate::{normalize_thumbprint, CertificateBundle};
use crate::error::ConfigurationError;

/// Read-only certificate store.
pub trait CertificateStore: Send + Sync {
    /// Find the certificate whose SHA-1 thumbprint matches exactly.
    fn find_by_thumbprint(
        &self,
        thumbprint: &str,
    ) -> Result<Option<CertificateBundle>, ConfigurationError>;
}

/// Personal certificate store for the current user, backed by a directory of
/// PEM bundles.
///
/// The default location is `{config dir}/o365-mail/certs/my`. Files ending in
/// `.pem` or `.crt` are considered; files that do not parse are skipped.
#[derive(Debug, Clone)]
pub struct FileCertificateStore {
    root: PathBuf,
}

impl FileCertificateStore {
    /// Store rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Current user's personal store.
    pub fn current_user() -> Result<Self, ConfigurationError> {
        let base = dirs::config_dir().ok_or_else(|| ConfigurationError::StoreUnavailable {
            message: "no configuration directory for the current user".to_string(),
        })?;
        Ok(Self::new(base.join("o365-mail").join("certs").join("my")))
    }

    /// Directory the store reads from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_candidate(path: &Path) -> bool {
        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("pem") | Some("crt")
        )
    }
}

impl CertificateStore for FileCertificateStore {
    fn find_by_thumbprint(
        &self,
        thumbprint: &str,
    ) -> Result<Option<CertificateBundle>, ConfigurationError> {
        let wanted = normalize_thumbprint(thumbprint);

        let entries = match std::fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(ConfigurationError::StoreUnavailable {
                    message: format!("{}: {}", self.root.display(), e),
                })
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_file() || !Self::is_candidate(&path) {
                continue;
            }

            let Ok(bytes) = std::fs::read(&path) else {
                continue;
            };
            let Ok(bundle) = CertificateBundle::from_pem(&bytes) else {
                tracing::debug!(path = %path.display(), "Skipping unreadable certificate file");
                continue;
            };

            if bundle.thumbprint() == wanted {
                return Ok(Some(bundle));
            }
        }

        Ok(None)
    }
}

/// In-memory certificate store for testing.
#[derive(Default)]
pub struct InMemoryCertificateStore {
    bundles: Mutex<Vec<CertificateBundle>>,
}

impl InMemoryCertificateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a certificate to the store.
    pub fn add(&self, bundle: CertificateBundle) -> &Self {
        self.bundles.lock().unwrap().push(bundle);
        self
    }
}

impl CertificateStore for InMemoryCertificateStore {
    fn find_by_thumbprint(
        &self,
        thumbprint: &str,
    ) -> Result<Option<CertificateBundle>, ConfigurationError> {
        let wanted = normalize_thumbprint(thumbprint);
        Ok(self
            .bundles
            .lock()
            .unwrap()
            .iter()
            .find(|b| b.thumbprint() == wanted)
            .cloned())
    }
}
