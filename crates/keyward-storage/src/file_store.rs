//! File-backed secret store.
//!
//! Records live in a single redb table. Values are Base64 encoded JSON, which
//! keeps passwords out of casual `strings` output but is not encryption.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::STANDARD};
use redb::{Database, ReadableDatabase, TableDefinition};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::{SecretKey, SecretStore, SecretStoreError};

const SECRETS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("secrets");

/// A stored password with bookkeeping timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredSecret {
    value: String,
    created_at: i64,
    updated_at: i64,
}

impl StoredSecret {
    fn new(value: String) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        Self {
            value,
            created_at: now,
            updated_at: now,
        }
    }

    fn update(&mut self, value: String) {
        self.value = value;
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

#[derive(Debug, Clone)]
pub struct FileSecretStore {
    db: Arc<Database>,
}

impl FileSecretStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SecretStoreError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(backend)?;
        }
        let db = Database::create(path).map_err(backend)?;
        debug!(path = %path.display(), "Opened file secret store");
        Self::new(Arc::new(db))
    }

    pub fn new(db: Arc<Database>) -> Result<Self, SecretStoreError> {
        let write_txn = db.begin_write().map_err(backend)?;
        write_txn.open_table(SECRETS_TABLE).map_err(backend)?;
        write_txn.commit().map_err(backend)?;

        Ok(Self { db })
    }

    fn read_record(&self, key: &str) -> Result<Option<StoredSecret>, SecretStoreError> {
        let read_txn = self.db.begin_read().map_err(backend)?;
        let table = read_txn.open_table(SECRETS_TABLE).map_err(backend)?;

        let Some(data) = table.get(key).map_err(backend)? else {
            return Ok(None);
        };
        let decoded = STANDARD.decode(data.value()).map_err(backend)?;
        let record = serde_json::from_slice(&decoded).map_err(backend)?;
        Ok(Some(record))
    }

    fn write_record(&self, key: &str, password: String) -> Result<(), SecretStoreError> {
        let record = match self.read_record(key)? {
            Some(mut existing) => {
                existing.update(password);
                existing
            }
            None => StoredSecret::new(password),
        };

        let json = serde_json::to_vec(&record).map_err(backend)?;
        let encoded = STANDARD.encode(json);

        let write_txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = write_txn.open_table(SECRETS_TABLE).map_err(backend)?;
            table.insert(key, encoded.as_bytes()).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;
        Ok(())
    }

    fn remove_record(&self, key: &str) -> Result<(), SecretStoreError> {
        let write_txn = self.db.begin_write().map_err(backend)?;
        {
            let mut table = write_txn.open_table(SECRETS_TABLE).map_err(backend)?;
            table.remove(key).map_err(backend)?;
        }
        write_txn.commit().map_err(backend)?;
        Ok(())
    }

    /// Run a database operation off the async worker threads.
    async fn blocking<T, F>(&self, key: &SecretKey, op: F) -> Result<T, SecretStoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Self, &str) -> Result<T, SecretStoreError> + Send + 'static,
    {
        let store = self.clone();
        let key = key.as_str().to_string();
        tokio::task::spawn_blocking(move || op(&store, &key))
            .await
            .map_err(|e| SecretStoreError::Backend(format!("file store join error: {e}")))?
    }
}

#[async_trait]
impl SecretStore for FileSecretStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn get(&self, key: &SecretKey) -> Result<Option<String>, SecretStoreError> {
        let record = self
            .blocking(key, |store, key| store.read_record(key))
            .await?;
        Ok(record
            .map(|record| record.value)
            .filter(|value| !value.is_empty()))
    }

    async fn set(&self, key: &SecretKey, password: &str) -> Result<(), SecretStoreError> {
        let password = password.to_string();
        self.blocking(key, move |store, key| store.write_record(key, password))
            .await
    }

    async fn clear(&self, key: &SecretKey) -> Result<(), SecretStoreError> {
        self.blocking(key, |store, key| store.remove_record(key))
            .await
    }
}

fn backend(err: impl std::fmt::Display) -> SecretStoreError {
    SecretStoreError::Backend(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn setup() -> (FileSecretStore, tempfile::TempDir) {
        let temp_dir = tempdir().unwrap();
        let store = FileSecretStore::open(temp_dir.path().join("nested").join("secrets.db")).unwrap();
        (store, temp_dir)
    }

    #[tokio::test]
    async fn test_set_and_get_secret() {
        let (store, _temp_dir) = setup();
        let key = SecretKey::http("https://example.com/repos", "alice");

        store.set(&key, "p1").await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), Some("p1".to_string()));
    }

    #[tokio::test]
    async fn test_overwrite_keeps_created_at() {
        let (store, _temp_dir) = setup();
        let key = SecretKey::http("https://example.com", "alice");

        store.set(&key, "first").await.unwrap();
        let created = store.read_record(key.as_str()).unwrap().unwrap().created_at;
        store.set(&key, "second").await.unwrap();

        let record = store.read_record(key.as_str()).unwrap().unwrap();
        assert_eq!(record.value, "second");
        assert_eq!(record.created_at, created);
        assert!(record.updated_at >= created);
    }

    #[tokio::test]
    async fn test_clear_removes_secret() {
        let (store, _temp_dir) = setup();
        let key = SecretKey::smtp("mail.example.com", 25, "bob");

        store.set(&key, "pw").await.unwrap();
        store.clear(&key).await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), None);

        // Clearing an absent key is not an error
        store.clear(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_empty_value_reads_as_absent() {
        let (store, _temp_dir) = setup();
        let key = SecretKey::http("https://example.com", "alice");

        store.set(&key, "").await.unwrap();
        assert_eq!(store.get(&key).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_reopen_persists() {
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("secrets.db");
        let key = SecretKey::http("https://example.com", "alice");
        {
            let store = FileSecretStore::open(&path).unwrap();
            store.set(&key, "kept").await.unwrap();
        }
        let store = FileSecretStore::open(&path).unwrap();
        assert_eq!(store.get(&key).await.unwrap().as_deref(), Some("kept"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_concurrent_tasks_share_store() {
        let (store, _temp_dir) = setup();
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    let key = SecretKey::http("https://example.com", &format!("user{i}"));
                    store.set(&key, &format!("pw{i}")).await.unwrap();
                    store.get(&key).await.unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), Some(format!("pw{i}")));
        }
    }
}
