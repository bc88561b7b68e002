//! Core types for credential resolution

use serde::{Deserialize, Serialize};

/// Where a resolved password came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialSource {
    /// Username and password embedded in the request URL
    EmbeddedUrl,
    /// Already known to the host transport
    HostCache,
    /// `[[auth]]` configuration entry
    StaticConfig,
    /// In-process cache of this resolver
    ShortTermCache,
    /// Persistent secret store
    SecretStore,
    /// Entered at the prompt
    Interactive,
}

impl std::fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialSource::EmbeddedUrl => write!(f, "repository URL"),
            CredentialSource::HostCache => write!(f, "transport cache"),
            CredentialSource::StaticConfig => write!(f, "configuration"),
            CredentialSource::ShortTermCache => write!(f, "temporary cache"),
            CredentialSource::SecretStore => write!(f, "secret store"),
            CredentialSource::Interactive => write!(f, "prompt"),
        }
    }
}

/// Credential handed back by [`crate::CredentialResolver::authenticate`].
#[derive(Clone, PartialEq, Eq)]
pub struct ResolvedCredential {
    pub username: String,
    pub password: String,
    pub source: CredentialSource,
    pub scope_url: String,
}

impl std::fmt::Debug for ResolvedCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolvedCredential")
            .field("username", &self.username)
            .field("password", &"********")
            .field("source", &self.source)
            .field("scope_url", &self.scope_url)
            .finish()
    }
}

/// Read-only view produced by [`crate::CredentialResolver::describe`].
#[derive(Clone, PartialEq, Eq, Serialize)]
pub struct CredentialReport {
    pub username: Option<String>,
    #[serde(skip)]
    pub password: Option<String>,
    pub source: Option<CredentialSource>,
    pub scope_url: String,
}

impl CredentialReport {
    pub fn has_password(&self) -> bool {
        self.password.is_some()
    }
}

impl std::fmt::Debug for CredentialReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialReport")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("source", &self.source)
            .field("scope_url", &self.scope_url)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_source_labels() {
        assert_eq!(CredentialSource::StaticConfig.to_string(), "configuration");
        assert_eq!(
            serde_json::to_string(&CredentialSource::ShortTermCache).unwrap(),
            "\"short_term_cache\""
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let cred = ResolvedCredential {
            username: "alice".into(),
            password: "hunter2".into(),
            source: CredentialSource::Interactive,
            scope_url: "https://example.com".into(),
        };
        assert!(!format!("{cred:?}").contains("hunter2"));
    }
}
