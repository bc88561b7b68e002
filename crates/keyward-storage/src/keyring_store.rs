//! OS keychain backend.
//!
//! Uses the `keyring` crate to reach the platform secret service
//! (macOS Keychain, Secret Service, Windows Credential Manager).

use async_trait::async_trait;
use tracing::debug;

use crate::types::{SecretKey, SecretStore, SecretStoreError};

#[derive(Debug)]
pub struct KeyringSecretStore {
    service: String,
}

impl KeyringSecretStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
        }
    }

    fn entry(&self, key: &SecretKey) -> Result<keyring::Entry, SecretStoreError> {
        if key.as_str().is_empty() {
            return Err(SecretStoreError::InvalidKey);
        }
        keyring::Entry::new(&self.service, key.as_str())
            .map_err(|e| SecretStoreError::Unavailable(format!("keyring entry error: {e}")))
    }
}

#[async_trait]
impl SecretStore for KeyringSecretStore {
    fn name(&self) -> &str {
        "keyring"
    }

    async fn get(&self, key: &SecretKey) -> Result<Option<String>, SecretStoreError> {
        let entry = self.entry(key)?;
        let res = tokio::task::spawn_blocking(move || entry.get_password())
            .await
            .map_err(|e| SecretStoreError::Backend(format!("keyring join error: {e}")))?;

        match res {
            // Older tooling cleared entries by writing an empty password
            Ok(password) if password.is_empty() => Ok(None),
            Ok(password) => Ok(Some(password)),
            Err(keyring::Error::NoEntry) => {
                debug!(service = %self.service, key = %key, "No keyring entry found");
                Ok(None)
            }
            Err(e) => Err(SecretStoreError::Backend(format!("keyring get error: {e}"))),
        }
    }

    async fn set(&self, key: &SecretKey, password: &str) -> Result<(), SecretStoreError> {
        let entry = self.entry(key)?;
        let password = password.to_string();
        tokio::task::spawn_blocking(move || entry.set_password(&password))
            .await
            .map_err(|e| SecretStoreError::Backend(format!("keyring join error: {e}")))?
            .map_err(|e| SecretStoreError::Unavailable(format!("keyring set error: {e}")))
    }

    async fn clear(&self, key: &SecretKey) -> Result<(), SecretStoreError> {
        let entry = self.entry(key)?;
        let res = tokio::task::spawn_blocking(move || entry.delete_credential())
            .await
            .map_err(|e| SecretStoreError::Backend(format!("keyring join error: {e}")))?;
        match res {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(SecretStoreError::Backend(format!(
                "keyring delete error: {e}"
            ))),
        }
    }
}
