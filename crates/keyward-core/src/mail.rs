//! SMTP login with saved passwords.
//!
//! Mail servers report a rejected password immediately, so instead of the
//! bad-auth memo used for HTTP the login is simply retried with a freshly
//! prompted password until the server accepts it.

use std::sync::Arc;

use async_trait::async_trait;
use keyward_storage::{SecretKey, SecretStore};
use tracing::{debug, info, warn};

use crate::error::{AuthError, Result};
use crate::prompt::{InteractivePrompt, PromptRequest};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Accepted,
    /// The server refused the credentials (SMTP 535)
    Rejected(String),
}

/// An SMTP session able to attempt a login.
///
/// Failures other than rejected credentials are returned as errors and
/// abort the login.
#[async_trait]
pub trait MailLogin: Send {
    async fn login(&mut self, username: &str, password: &str) -> Result<LoginOutcome>;
}

pub struct MailAuthenticator {
    store: Arc<dyn SecretStore>,
    prompt: Arc<dyn InteractivePrompt>,
}

impl MailAuthenticator {
    pub fn new(store: Arc<dyn SecretStore>, prompt: Arc<dyn InteractivePrompt>) -> Self {
        Self { store, prompt }
    }

    /// Log `username` in on `host:port`, returning the accepted password.
    ///
    /// Starts with the saved password and prompts after every rejection.
    /// An empty answer at the prompt ends the login with
    /// [`AuthError::NoPasswordEntered`].
    /// The accepted password is saved when it differs from the stored one.
    pub async fn login<S: MailLogin + ?Sized>(
        &self,
        host: &str,
        port: u16,
        username: &str,
        session: &mut S,
    ) -> Result<String> {
        let key = SecretKey::smtp(host, port, username);
        let stored = match self.store.get(&key).await {
            Ok(stored) => stored.filter(|p| !p.is_empty()),
            Err(e) => {
                warn!(error = %e, key = %key, "Secret store lookup failed");
                None
            }
        };

        let mut password = stored.clone().unwrap_or_default();
        while !try_login(session, username, &password).await? {
            let request = PromptRequest {
                realm: format!("{username} on {host}:{port}"),
                url: format!("smtp://{host}:{port}"),
                scheme: "smtp".to_string(),
                host: format!("{host}:{port}"),
                path: String::new(),
                username: Some(username.to_string()),
            };
            if !self.prompt.is_interactive() {
                return Err(AuthError::NonInteractiveAuthRequired {
                    realm: request.realm,
                    url: request.url,
                });
            }
            password = self.prompt.ask(&request).await?.password;
            if password.is_empty() {
                return Err(AuthError::NoPasswordEntered {
                    realm: request.realm,
                    url: request.url,
                });
            }
        }

        if stored.as_deref() != Some(password.as_str()) {
            debug!(key = %key, "Saving mail password");
            if let Err(e) = self.store.set(&key, &password).await {
                warn!(error = %e, key = %key, "Failed to save mail password");
            }
        }
        Ok(password)
    }
}

async fn try_login<S: MailLogin + ?Sized>(
    session: &mut S,
    username: &str,
    password: &str,
) -> Result<bool> {
    if password.is_empty() {
        return Ok(false);
    }
    debug!(username, "Authenticating to mail server");
    match session.login(username, password).await? {
        LoginOutcome::Accepted => Ok(true),
        LoginOutcome::Rejected(reason) => {
            info!(reason = %reason, "SMTP login failed");
            Ok(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{RecordingStore, ScriptedPrompt};

    struct FakeServer {
        accepts: String,
        attempts: Vec<String>,
    }

    impl FakeServer {
        fn accepting(password: &str) -> Self {
            Self {
                accepts: password.to_string(),
                attempts: Vec::new(),
            }
        }
    }

    #[async_trait]
    impl MailLogin for FakeServer {
        async fn login(&mut self, _username: &str, password: &str) -> Result<LoginOutcome> {
            self.attempts.push(password.to_string());
            if password == self.accepts {
                Ok(LoginOutcome::Accepted)
            } else {
                Ok(LoginOutcome::Rejected("5.7.8 authentication failed".to_string()))
            }
        }
    }

    const KEY: &str = "joe@@smtp.example.com:587";

    #[tokio::test]
    async fn test_saved_password_accepted() {
        let store = Arc::new(RecordingStore::new());
        store.insert(KEY, "good");
        let prompt = Arc::new(ScriptedPrompt::new(&[]));
        let auth = MailAuthenticator::new(store.clone(), prompt.clone());
        let mut server = FakeServer::accepting("good");

        let password = auth.login("smtp.example.com", 587, "joe", &mut server).await.unwrap();
        assert_eq!(password, "good");
        assert_eq!(prompt.asked(), 0);
        assert_eq!(store.sets(), 0);
    }

    #[tokio::test]
    async fn test_retries_until_accepted() {
        let store = Arc::new(RecordingStore::new());
        store.insert(KEY, "old");
        let prompt = Arc::new(ScriptedPrompt::new(&["typo", "good"]));
        let auth = MailAuthenticator::new(store.clone(), prompt.clone());
        let mut server = FakeServer::accepting("good");

        let password = auth.login("smtp.example.com", 587, "joe", &mut server).await.unwrap();
        assert_eq!(password, "good");
        assert_eq!(server.attempts, vec!["old", "typo", "good"]);
        assert_eq!(prompt.asked(), 2);
        assert_eq!(store.value(KEY).as_deref(), Some("good"));
    }

    #[tokio::test]
    async fn test_non_interactive_rejection() {
        let store = Arc::new(RecordingStore::new());
        let prompt = Arc::new(ScriptedPrompt::non_interactive());
        let auth = MailAuthenticator::new(store, prompt);
        let mut server = FakeServer::accepting("good");

        let err = auth
            .login("smtp.example.com", 587, "joe", &mut server)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NonInteractiveAuthRequired { .. }));
        assert!(server.attempts.is_empty());
    }

    #[tokio::test]
    async fn test_empty_answer_ends_login() {
        let store = Arc::new(RecordingStore::new());
        let prompt = Arc::new(ScriptedPrompt::new(&["", "never"]));
        let auth = MailAuthenticator::new(store.clone(), prompt.clone());
        let mut server = FakeServer::accepting("good");

        let err = auth
            .login("smtp.example.com", 587, "joe", &mut server)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AuthError::NoPasswordEntered { ref url, .. } if url == "smtp://smtp.example.com:587"
        ));
        assert_eq!(prompt.asked(), 1);
        // Neither the missing saved password nor the empty answer reach the server
        assert!(server.attempts.is_empty());
        assert_eq!(store.sets(), 0);
    }
}
