use std::io::{BufRead, IsTerminal, Write};

use async_trait::async_trait;
use tracing::debug;

use super::{InteractivePrompt, PromptReply, PromptRequest};
use crate::error::{AuthError, Result};

/// Asks on the controlling terminal. Messages go to stderr so stdout stays
/// clean for command output.
#[derive(Debug, Clone)]
pub struct TerminalPrompt {
    interactive: bool,
}

impl TerminalPrompt {
    /// Interactive when stdin is a terminal.
    pub fn new() -> Self {
        Self {
            interactive: std::io::stdin().is_terminal(),
        }
    }

    /// Force prompting on or off.
    pub fn with_interactive(interactive: bool) -> Self {
        Self { interactive }
    }

    /// Read a username, offering `default` when the answer is empty.
    pub async fn prompt_username(&self, default: Option<&str>) -> Result<String> {
        let default = default.map(str::to_string);
        run_blocking(move || {
            let mut stderr = std::io::stderr();
            match &default {
                Some(default) => write!(stderr, "user [{default}]: ")?,
                None => write!(stderr, "user: ")?,
            }
            stderr.flush()?;

            let mut line = String::new();
            std::io::stdin().lock().read_line(&mut line)?;
            let answer = line.trim_end_matches(['\r', '\n']).to_string();
            Ok(match default {
                Some(default) if answer.is_empty() => default,
                _ => answer,
            })
        })
        .await
    }

    /// Read a password without echoing it.
    pub async fn prompt_password_masked(&self, label: &str) -> Result<String> {
        let label = label.to_string();
        run_blocking(move || rpassword::prompt_password(label)).await
    }
}

impl Default for TerminalPrompt {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InteractivePrompt for TerminalPrompt {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    async fn ask(&self, request: &PromptRequest) -> Result<PromptReply> {
        if !self.interactive {
            return Err(AuthError::NonInteractiveAuthRequired {
                realm: request.realm.clone(),
                url: request.url.clone(),
            });
        }

        let mut stderr = std::io::stderr();
        if request.username.is_none() {
            writeln!(
                stderr,
                "username not specified in configuration or URL, password will not be saved"
            )?;
        }
        writeln!(stderr, "{} authorization required", request.scheme)?;
        writeln!(stderr, "realm: {}", request.realm)?;
        writeln!(stderr, "url: {}", request.url)?;

        let username = match &request.username {
            Some(user) => {
                writeln!(stderr, "user: {user} (fixed in configuration or URL)")?;
                user.clone()
            }
            None => self.prompt_username(None).await?,
        };
        let password = self.prompt_password_masked("password: ").await?;
        debug!(realm = %request.realm, url = %request.url, "Password entered at terminal");

        Ok(PromptReply {
            username: Some(username).filter(|u| !u.is_empty()),
            password,
        })
    }
}

/// Run a terminal read off the async runtime.
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> std::io::Result<T> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AuthError::Prompt(e.to_string()))?
        .map_err(AuthError::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_non_interactive_terminal_refuses() {
        let prompt = TerminalPrompt::with_interactive(false);
        let request = PromptRequest {
            realm: "realm".into(),
            url: "https://example.com".into(),
            scheme: "https".into(),
            host: "example.com".into(),
            path: "/".into(),
            username: None,
        };
        assert!(!prompt.is_interactive());
        assert!(matches!(
            prompt.ask(&request).await,
            Err(AuthError::NonInteractiveAuthRequired { .. })
        ));
    }
}
