//! Credential resolver
//!
//! Sequences every credential source for one authentication challenge:
//!
//! 1. URL embedded username and password
//! 2. Passwords already known to the host transport
//! 3. `[[auth]]` configuration
//! 4. Short-term cache and secret store, unless the previous answer for the
//!    same request was rejected
//! 5. Interactive prompt, whose answer is cached and saved
//!
//! The last request fingerprint is recorded after every call, successful or
//! not, so a retry of the same request bypasses caches and asks again.

use std::sync::Arc;

use keyward_storage::{SecretKey, SecretStore};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{ScopeKey, ShortTermCache};
use crate::detector::{AttemptFingerprint, BadAuthDetector, RequestIdentity};
use crate::endpoint::UnpackedUrl;
use crate::error::{AuthError, Result};
use crate::host::{HostPasswordDb, NoHostPasswords};
use crate::prompt::{InteractivePrompt, PromptRequest};
use crate::scope::ScopeResolver;
use crate::types::{CredentialReport, CredentialSource, ResolvedCredential};

#[derive(Debug, Default)]
struct ResolverState {
    cache: ShortTermCache,
    detector: BadAuthDetector,
}

/// Result of the non-interactive part of resolution.
struct Lookup {
    url: UnpackedUrl,
    username: Option<String>,
    password: Option<String>,
    source: Option<CredentialSource>,
    scope_url: String,
}

impl Lookup {
    fn found(mut self, username: Option<String>, password: String, source: CredentialSource) -> Self {
        self.username = username;
        self.password = Some(password);
        self.source = Some(source);
        self
    }
}

/// Resolves usernames and passwords for one session.
///
/// Cache and bad-auth state are owned by the instance; create one resolver
/// per logical session.
pub struct CredentialResolver {
    scopes: ScopeResolver,
    store: Arc<dyn SecretStore>,
    prompt: Arc<dyn InteractivePrompt>,
    host: Arc<dyn HostPasswordDb>,
    state: Mutex<ResolverState>,
}

impl CredentialResolver {
    pub fn new(
        scopes: ScopeResolver,
        store: Arc<dyn SecretStore>,
        prompt: Arc<dyn InteractivePrompt>,
    ) -> Self {
        Self {
            scopes,
            store,
            prompt,
            host: Arc::new(NoHostPasswords),
            state: Mutex::new(ResolverState::default()),
        }
    }

    pub fn with_host_passwords(mut self, host: Arc<dyn HostPasswordDb>) -> Self {
        self.host = host;
        self
    }

    pub fn store(&self) -> &Arc<dyn SecretStore> {
        &self.store
    }

    /// Credentials for an authentication challenge.
    ///
    /// Calling again with the same `realm`, `request_uri` and
    /// `request_identity` signals that the previous answer was rejected:
    /// cached and saved passwords are skipped and the user is asked again.
    pub async fn authenticate(
        &self,
        realm: &str,
        request_uri: &str,
        request_identity: Option<RequestIdentity>,
    ) -> Result<ResolvedCredential> {
        let fingerprint = AttemptFingerprint::new(realm, request_uri, request_identity);
        let state = self.state.lock().await;
        let after_bad_auth = state.detector.is_repeat(&fingerprint);
        let mut state = scopeguard::guard(state, move |mut state| {
            state.detector.record(fingerprint);
        });

        if after_bad_auth {
            info!(realm = %realm, url = %request_uri, "Previous credentials were rejected, cached passwords not used");
        }

        let lookup = self
            .lookup(&state.cache, realm, request_uri, after_bad_auth)
            .await?;
        let request = prompt_request(realm, &lookup);

        if after_bad_auth && let Err(e) = self.prompt.forget(&request).await {
            warn!(error = %e, "Failed to discard rejected credentials");
        }

        if let (Some(password), Some(source)) = (lookup.password, lookup.source) {
            let key = ScopeKey::new(realm, &lookup.scope_url, lookup.username.as_deref());
            if source != CredentialSource::ShortTermCache {
                state.cache.store(key, &password);
            }
            debug!(realm = %realm, url = %lookup.scope_url, source = %source, "Password found");
            return Ok(ResolvedCredential {
                username: lookup.username.unwrap_or_default(),
                password,
                source,
                scope_url: lookup.scope_url,
            });
        }

        if !self.prompt.is_interactive() {
            return Err(AuthError::NonInteractiveAuthRequired {
                realm: realm.to_string(),
                url: lookup.scope_url,
            });
        }

        let reply = self.prompt.ask(&request).await?;
        let username = lookup.username.or(reply.username).unwrap_or_default();
        if reply.password.is_empty() {
            return Err(AuthError::NoPasswordEntered {
                realm: realm.to_string(),
                url: lookup.scope_url,
            });
        }

        // Without a username the password could never be found again
        if !username.is_empty() {
            debug!(username = %username, url = %lookup.scope_url, store = self.store.name(), "Saving password");
            let key = SecretKey::http(&lookup.scope_url, &username);
            if let Err(e) = self.store.set(&key, &reply.password).await {
                warn!(error = %e, url = %lookup.scope_url, "Failed to save password in secret store");
            }
        }

        let cache_user = Some(username.as_str()).filter(|u| !u.is_empty());
        let key = ScopeKey::new(realm, &lookup.scope_url, cache_user);
        state.cache.store(key, &reply.password);
        debug!(realm = %realm, url = %lookup.scope_url, "Manually entered password");

        Ok(ResolvedCredential {
            username,
            password: reply.password,
            source: CredentialSource::Interactive,
            scope_url: lookup.scope_url,
        })
    }

    /// What [`authenticate`](Self::authenticate) would find without prompting.
    ///
    /// Never prompts, never writes and leaves the bad-auth memo untouched.
    pub async fn describe(&self, realm: &str, url: &str) -> Result<CredentialReport> {
        let state = self.state.lock().await;
        let lookup = self.lookup(&state.cache, realm, url, false).await?;
        Ok(CredentialReport {
            username: lookup.username,
            password: lookup.password,
            source: lookup.source,
            scope_url: lookup.scope_url,
        })
    }

    async fn lookup(
        &self,
        cache: &ShortTermCache,
        realm: &str,
        request_uri: &str,
        skip_caches: bool,
    ) -> Result<Lookup> {
        let url = UnpackedUrl::parse(request_uri)?;
        let base = Lookup {
            username: None,
            password: None,
            source: None,
            scope_url: url.base_url.clone(),
            url,
        };

        if let (Some(user), Some(password)) = (base.url.username.clone(), base.url.password.clone()) {
            return Ok(base.found(Some(user), password, CredentialSource::EmbeddedUrl));
        }

        let (host_user, host_password) = self.host.find_user_password(realm, request_uri);
        let host_user = host_user.filter(|u| !u.is_empty());
        if let (Some(user), Some(password)) = (host_user.clone(), host_password.filter(|p| !p.is_empty())) {
            return Ok(base.found(Some(user), password, CredentialSource::HostCache));
        }

        let scope = self.scopes.resolve(realm, &base.url, host_user.as_deref())?;
        let mut lookup = Lookup {
            username: scope.username,
            scope_url: scope.scope_url,
            ..base
        };

        if lookup.username.is_some()
            && let Some(password) = scope.password
        {
            let username = lookup.username.take();
            return Ok(lookup.found(username, password, CredentialSource::StaticConfig));
        }

        if skip_caches {
            return Ok(lookup);
        }

        let key = ScopeKey::new(realm, &lookup.scope_url, lookup.username.as_deref());
        if let Some(password) = cache.check(&key) {
            let username = lookup.username.take();
            return Ok(lookup.found(username, password.to_string(), CredentialSource::ShortTermCache));
        }

        if let Some(secret_key) = key.secret_key() {
            debug!(key = %secret_key, store = self.store.name(), "Looking up saved password");
            match self.store.get(&secret_key).await {
                Ok(Some(password)) if !password.is_empty() => {
                    let username = lookup.username.take();
                    return Ok(lookup.found(username, password, CredentialSource::SecretStore));
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(error = %e, key = %secret_key, "Secret store lookup failed, treating password as absent");
                }
            }
        }

        Ok(lookup)
    }
}

fn prompt_request(realm: &str, lookup: &Lookup) -> PromptRequest {
    PromptRequest {
        realm: realm.to_string(),
        url: lookup.scope_url.clone(),
        scheme: lookup.url.scheme.clone(),
        host: lookup.url.host.clone(),
        path: lookup.url.path.clone(),
        username: lookup.username.clone(),
    }
}
