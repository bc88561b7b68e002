//! Test doubles for the resolver's collaborators.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use keyward_storage::{SecretKey, SecretStore, SecretStoreError};
use parking_lot::Mutex;

use crate::error::{AuthError, Result};
use crate::host::HostPasswordDb;
use crate::prompt::{InteractivePrompt, PromptReply, PromptRequest};

/// Prompt answering with a fixed list of passwords, in order.
pub struct ScriptedPrompt {
    interactive: bool,
    username: Option<String>,
    answers: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<PromptRequest>>,
    forgotten: AtomicUsize,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Self {
        Self {
            interactive: true,
            username: None,
            answers: Mutex::new(answers.iter().map(|a| a.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
            forgotten: AtomicUsize::new(0),
        }
    }

    pub fn non_interactive() -> Self {
        Self {
            interactive: false,
            ..Self::new(&[])
        }
    }

    /// Username typed whenever the request leaves it open.
    pub fn with_username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn asked(&self) -> usize {
        self.requests.lock().len()
    }

    pub fn requests(&self) -> Vec<PromptRequest> {
        self.requests.lock().clone()
    }

    pub fn forgotten(&self) -> usize {
        self.forgotten.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl InteractivePrompt for ScriptedPrompt {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    async fn ask(&self, request: &PromptRequest) -> Result<PromptReply> {
        self.requests.lock().push(request.clone());
        let password = self
            .answers
            .lock()
            .pop_front()
            .ok_or_else(|| AuthError::Prompt("no scripted answer left".to_string()))?;
        Ok(PromptReply {
            username: self.username.clone(),
            password,
        })
    }

    async fn forget(&self, _request: &PromptRequest) -> Result<()> {
        self.forgotten.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// In-memory store counting calls, with switchable failures.
#[derive(Default)]
pub struct RecordingStore {
    values: Mutex<HashMap<String, String>>,
    gets: AtomicUsize,
    sets: AtomicUsize,
    clears: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a value without counting it as a write.
    pub fn insert(&self, key: &str, password: &str) {
        self.values.lock().insert(key.to_string(), password.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values.lock().get(key).cloned()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }

    pub fn sets(&self) -> usize {
        self.sets.load(Ordering::SeqCst)
    }

    pub fn clears(&self) -> usize {
        self.clears.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for RecordingStore {
    fn name(&self) -> &str {
        "recording"
    }

    async fn get(&self, key: &SecretKey) -> std::result::Result<Option<String>, SecretStoreError> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SecretStoreError::Backend("read refused".to_string()));
        }
        Ok(self.value(key.as_str()))
    }

    async fn set(&self, key: &SecretKey, password: &str) -> std::result::Result<(), SecretStoreError> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SecretStoreError::Backend("write refused".to_string()));
        }
        self.insert(key.as_str(), password);
        Ok(())
    }

    async fn clear(&self, key: &SecretKey) -> std::result::Result<(), SecretStoreError> {
        self.clears.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SecretStoreError::Backend("write refused".to_string()));
        }
        self.values.lock().remove(key.as_str());
        Ok(())
    }
}

/// Host password database with fixed per-realm answers.
#[derive(Debug, Clone, Default)]
pub struct StaticHostPasswords {
    by_realm: HashMap<String, (Option<String>, Option<String>)>,
}

impl StaticHostPasswords {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, realm: &str, username: &str, password: &str) -> Self {
        self.by_realm.insert(
            realm.to_string(),
            (Some(username.to_string()), Some(password.to_string())),
        );
        self
    }

    pub fn with_username(mut self, realm: &str, username: &str) -> Self {
        self.by_realm
            .insert(realm.to_string(), (Some(username.to_string()), None));
        self
    }
}

impl HostPasswordDb for StaticHostPasswords {
    fn find_user_password(&self, realm: &str, _uri: &str) -> (Option<String>, Option<String>) {
        self.by_realm.get(realm).cloned().unwrap_or((None, None))
    }
}
