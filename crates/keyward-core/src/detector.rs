//! Repeated challenge detection.
//!
//! The transport asks for credentials again with the same pending request
//! exactly when the server rejected the previous answer. Remembering the
//! last attempt is enough to tell a retry from a fresh request.

use uuid::Uuid;

/// Handle for one outgoing request attempt.
///
/// Identity is by handle, not by content: two requests to the same URL get
/// different identities. Clone the handle to refer to the same attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestIdentity(Uuid);

impl RequestIdentity {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for RequestIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptFingerprint {
    pub realm: String,
    pub request_uri: String,
    pub request_identity: Option<RequestIdentity>,
}

impl AttemptFingerprint {
    pub fn new(realm: &str, request_uri: &str, request_identity: Option<RequestIdentity>) -> Self {
        Self {
            realm: realm.to_string(),
            request_uri: request_uri.to_string(),
            request_identity,
        }
    }
}

/// Single-slot memo of the last credential request.
#[derive(Debug, Default)]
pub struct BadAuthDetector {
    last: Option<AttemptFingerprint>,
}

impl BadAuthDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether `fingerprint` repeats the previous request, meaning the
    /// credential returned for it was rejected.
    pub fn is_repeat(&self, fingerprint: &AttemptFingerprint) -> bool {
        self.last.as_ref() == Some(fingerprint)
    }

    pub fn record(&mut self, fingerprint: AttemptFingerprint) {
        self.last = Some(fingerprint);
    }

    pub fn last(&self) -> Option<&AttemptFingerprint> {
        self.last.as_ref()
    }
}
