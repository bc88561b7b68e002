use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::types::{SecretKey, SecretStore, SecretStoreError};

/// Process-lifetime secret store. Nothing survives the process.
#[derive(Default)]
pub struct MemorySecretStore {
    map: Mutex<HashMap<String, String>>,
}

impl MemorySecretStore {
    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.lock().is_empty()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn get(&self, key: &SecretKey) -> Result<Option<String>, SecretStoreError> {
        Ok(self.map.lock().get(key.as_str()).cloned())
    }

    async fn set(&self, key: &SecretKey, password: &str) -> Result<(), SecretStoreError> {
        self.map
            .lock()
            .insert(key.as_str().to_string(), password.to_string());
        Ok(())
    }

    async fn clear(&self, key: &SecretKey) -> Result<(), SecretStoreError> {
        self.map.lock().remove(key.as_str());
        Ok(())
    }
}
