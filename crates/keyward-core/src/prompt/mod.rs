//! Interactive credential prompting.
//!
//! The resolver asks an [`InteractivePrompt`] only when no other source
//! produced a password. Two implementations are provided: a terminal prompt
//! and an external helper program.

mod helper;
mod terminal;

pub use helper::{HELPER_ENV, HelperPrompt};
pub use terminal::TerminalPrompt;

use async_trait::async_trait;

use crate::error::Result;

/// Context shown to whoever answers the prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub realm: String,
    /// Scope URL the answer will be saved under
    pub url: String,
    pub scheme: String,
    pub host: String,
    pub path: String,
    /// Username fixed by the URL or configuration
    pub username: Option<String>,
}

#[derive(Clone, Default, PartialEq, Eq)]
pub struct PromptReply {
    pub username: Option<String>,
    pub password: String,
}

impl std::fmt::Debug for PromptReply {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptReply")
            .field("username", &self.username)
            .field("password", &if self.password.is_empty() { "" } else { "********" })
            .finish()
    }
}

#[async_trait]
pub trait InteractivePrompt: Send + Sync {
    /// Whether a human (or helper) can be asked at all.
    fn is_interactive(&self) -> bool;

    /// Ask for a password, and for a username unless `request.username` is set.
    async fn ask(&self, request: &PromptRequest) -> Result<PromptReply>;

    /// Called when the credential previously returned for `request` was
    /// rejected, so prompts with their own memory can drop it.
    async fn forget(&self, _request: &PromptRequest) -> Result<()> {
        Ok(())
    }
}

/// Prompt for environments where nobody can answer.
#[derive(Debug, Clone, Copy, Default)]
pub struct NonInteractive;

#[async_trait]
impl InteractivePrompt for NonInteractive {
    fn is_interactive(&self) -> bool {
        false
    }

    async fn ask(&self, request: &PromptRequest) -> Result<PromptReply> {
        Err(crate::error::AuthError::NonInteractiveAuthRequired {
            realm: request.realm.clone(),
            url: request.url.clone(),
        })
    }
}
