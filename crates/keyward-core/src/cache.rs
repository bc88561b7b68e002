//! Process-lifetime password cache.
//!
//! One command may issue many requests against the same endpoint; the cache
//! answers repeated lookups without touching the secret store. Entries are
//! only replaced, never expired.

use std::collections::HashMap;

use keyward_storage::SecretKey;

/// Identity of a cached or saved password.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub realm: String,
    pub scope_url: String,
    pub username: Option<String>,
}

impl ScopeKey {
    pub fn new(realm: &str, scope_url: &str, username: Option<&str>) -> Self {
        Self {
            realm: realm.to_string(),
            scope_url: scope_url.to_string(),
            username: username.map(str::to_string),
        }
    }

    /// Secret store key for this scope, when the username is known.
    pub fn secret_key(&self) -> Option<SecretKey> {
        self.username
            .as_deref()
            .filter(|u| !u.is_empty())
            .map(|u| SecretKey::http(&self.scope_url, u))
    }
}

#[derive(Default)]
pub struct ShortTermCache {
    entries: HashMap<ScopeKey, String>,
}

impl ShortTermCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, key: ScopeKey, password: &str) {
        self.entries.insert(key, password.to_string());
    }

    pub fn check(&self, key: &ScopeKey) -> Option<&str> {
        self.entries
            .get(key)
            .map(String::as_str)
            .filter(|p| !p.is_empty())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Debug for ShortTermCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShortTermCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}
