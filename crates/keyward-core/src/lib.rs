//! Keyward Core - credential resolution for outbound requests
//!
//! Given an authentication challenge (realm, request URL, request attempt),
//! [`CredentialResolver`] picks a username and password from embedded URL
//! credentials, the host transport, `[[auth]]` configuration, a short-term
//! cache, the persistent secret store and finally an interactive prompt.
//! A repeated challenge for the same request attempt means the previous
//! answer was rejected; caches are then bypassed and the user asked again.

pub mod admin;
pub mod cache;
pub mod config;
pub mod detector;
pub mod endpoint;
pub mod error;
pub mod host;
pub mod mail;
pub mod paths;
pub mod pattern;
pub mod prompt;
pub mod resolver;
pub mod scope;
pub mod template;
#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
pub mod types;

pub use admin::{ClearOutcome, Endpoint, EndpointReport, EndpointStatus};
pub use cache::{ScopeKey, ShortTermCache};
pub use config::{ConfigEntry, KeywardConfig};
pub use detector::{AttemptFingerprint, BadAuthDetector, RequestIdentity};
pub use endpoint::UnpackedUrl;
pub use error::{AuthError, Result};
pub use host::HostPasswordDb;
pub use mail::{LoginOutcome, MailAuthenticator, MailLogin};
pub use pattern::{InvalidPattern, PathPattern};
pub use prompt::{HelperPrompt, InteractivePrompt, NonInteractive, PromptReply, PromptRequest, TerminalPrompt};
pub use resolver::CredentialResolver;
pub use scope::{ScopeResolution, ScopeResolver};
pub use template::TextTemplate;
pub use types::{CredentialReport, CredentialSource, ResolvedCredential};
