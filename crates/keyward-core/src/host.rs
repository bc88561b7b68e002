//! Credentials already held by the host transport.

/// Password database of the calling HTTP layer, consulted before any
/// configured or saved credential.
pub trait HostPasswordDb: Send + Sync {
    /// Username and password registered for `realm` and `uri`, if any.
    /// Either part may be missing.
    fn find_user_password(&self, realm: &str, uri: &str) -> (Option<String>, Option<String>);
}

/// Host without a password database of its own.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHostPasswords;

impl HostPasswordDb for NoHostPasswords {
    fn find_user_password(&self, _realm: &str, _uri: &str) -> (Option<String>, Option<String>) {
        (None, None)
    }
}
