use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::file_store::FileSecretStore;
#[cfg(feature = "keychain")]
use crate::keyring_store::KeyringSecretStore;
use crate::memory_store::MemorySecretStore;

/// Default keyring service name.
pub const DEFAULT_SERVICE: &str = "keyward";

/// Identity of one stored password.
///
/// The textual shape is fixed so that passwords saved by earlier tooling
/// remain readable: `username@@scope_url` for HTTP credentials and
/// `username@@host:port` for mail credentials.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretKey(String);

impl SecretKey {
    /// Key for an HTTP credential bound to a scope URL.
    pub fn http(scope_url: &str, username: &str) -> Self {
        Self(format!("{username}@@{scope_url}"))
    }

    /// Key for an SMTP credential bound to a mail host.
    pub fn smtp(host: &str, port: u16, username: &str) -> Self {
        Self(format!("{username}@@{host}:{port}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Error)]
pub enum SecretStoreError {
    #[error("secret backend unavailable: {0}")]
    Unavailable(String),
    #[error("secret backend error: {0}")]
    Backend(String),
    #[error("invalid secret key")]
    InvalidKey,
}

/// Persistent password storage keyed by [`SecretKey`].
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Human readable backend name used in log and status output.
    fn name(&self) -> &str;

    async fn get(&self, key: &SecretKey) -> Result<Option<String>, SecretStoreError>;

    async fn set(&self, key: &SecretKey, password: &str) -> Result<(), SecretStoreError>;

    async fn clear(&self, key: &SecretKey) -> Result<(), SecretStoreError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SecretStoreKind {
    Keyring,
    File,
    Memory,
}

impl SecretStoreKind {
    /// Keyring when compiled with OS keychain support, the file store otherwise.
    pub fn platform_default() -> Self {
        if cfg!(feature = "keychain") {
            SecretStoreKind::Keyring
        } else {
            SecretStoreKind::File
        }
    }
}

impl Default for SecretStoreKind {
    fn default() -> Self {
        Self::platform_default()
    }
}

#[derive(Debug, Clone)]
pub struct SecretStoreOptions {
    pub kind: SecretStoreKind,
    /// Keyring service name.
    pub service: String,
    /// Database file. Required for the `File` backend.
    pub path: Option<PathBuf>,
}

impl Default for SecretStoreOptions {
    fn default() -> Self {
        Self {
            kind: SecretStoreKind::default(),
            service: DEFAULT_SERVICE.to_string(),
            path: None,
        }
    }
}

pub fn open_secret_store(
    opts: SecretStoreOptions,
) -> Result<Arc<dyn SecretStore>, SecretStoreError> {
    match opts.kind {
        SecretStoreKind::Keyring => open_keyring(opts.service),
        SecretStoreKind::File => {
            let path = opts.path.ok_or_else(|| {
                SecretStoreError::Unavailable("missing database path for file secret store".to_string())
            })?;
            Ok(Arc::new(FileSecretStore::open(path)?))
        }
        SecretStoreKind::Memory => Ok(Arc::new(MemorySecretStore::default())),
    }
}

#[cfg(feature = "keychain")]
fn open_keyring(service: String) -> Result<Arc<dyn SecretStore>, SecretStoreError> {
    Ok(Arc::new(KeyringSecretStore::new(service)))
}

#[cfg(not(feature = "keychain"))]
fn open_keyring(_service: String) -> Result<Arc<dyn SecretStore>, SecretStoreError> {
    Err(SecretStoreError::Unavailable(
        "keyring support not compiled in (enable the `keychain` feature)".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_key_shape() {
        let key = SecretKey::http("https://example.com/repos", "alice");
        assert_eq!(key.as_str(), "alice@@https://example.com/repos");
    }

    #[test]
    fn test_smtp_key_shape() {
        let key = SecretKey::smtp("mail.example.com", 587, "bob");
        assert_eq!(key.to_string(), "bob@@mail.example.com:587");
    }

    #[test]
    fn test_file_backend_requires_path() {
        let opts = SecretStoreOptions {
            kind: SecretStoreKind::File,
            path: None,
            ..Default::default()
        };
        assert!(matches!(
            open_secret_store(opts),
            Err(SecretStoreError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_open_memory_store() {
        let store = open_secret_store(SecretStoreOptions {
            kind: SecretStoreKind::Memory,
            ..Default::default()
        })
        .unwrap();
        let key = SecretKey::http("https://example.com", "alice");
        store.set(&key, "secret").await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some("secret".to_string()));
    }
}
