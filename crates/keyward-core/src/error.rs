//! Error types for credential resolution

use keyward_storage::SecretStoreError;
use thiserror::Error;

/// Credential resolution errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error(
        "username for {url} (realm: {realm}) specified both in the URL ({url_user}) and in [auth] configuration ({config_user}); leave only one of those"
    )]
    AmbiguousCredentialConfig {
        realm: String,
        url: String,
        url_user: String,
        config_user: String,
    },

    #[error("authorization required for {url} (realm: {realm}) but prompting is not possible in non-interactive mode")]
    NonInteractiveAuthRequired { realm: String, url: String },

    #[error("no password entered for {url} (realm: {realm})")]
    NoPasswordEntered { realm: String, url: String },

    #[error("invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("prompt failed: {0}")]
    Prompt(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("secret store error: {0}")]
    Store(#[from] SecretStoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for credential resolution
pub type Result<T> = std::result::Result<T, AuthError>;
