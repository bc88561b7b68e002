//! Scope narrowing against `[[auth]]` prefix entries.
//!
//! A request URL is matched against every configured prefix; the most
//! specific match decides the username, an optional static password and the
//! scope URL under which passwords are cached and saved.

use tracing::debug;

use crate::config::ConfigEntry;
use crate::endpoint::UnpackedUrl;
use crate::error::{AuthError, Result};

const WILDCARD: &str = "*";
const DEFAULT_SCHEME: &str = "https";

/// Outcome of [`ScopeResolver::resolve`].
#[derive(Clone, PartialEq, Eq)]
pub struct ScopeResolution {
    pub username: Option<String>,
    /// Static password from the matched entry
    pub password: Option<String>,
    /// Canonical URL used for cache and secret store keys
    pub scope_url: String,
    /// Name of the matched entry
    pub entry: Option<String>,
}

impl std::fmt::Debug for ScopeResolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeResolution")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("scope_url", &self.scope_url)
            .field("entry", &self.entry)
            .finish()
    }
}

/// A prefix split into the parts that take part in matching.
struct ParsedPrefix<'a> {
    scheme: Option<String>,
    user: Option<&'a str>,
    /// Prefix without scheme, as written
    host_path: &'a str,
    /// Prefix without scheme and user, authority lowercased
    normalized: String,
}

impl<'a> ParsedPrefix<'a> {
    fn parse(prefix: &'a str) -> Self {
        let (scheme, host_path) = match prefix.split_once("://") {
            Some((scheme, rest)) => (Some(scheme.to_ascii_lowercase()), rest),
            None => (None, prefix),
        };
        let (authority, path) = match host_path.find('/') {
            Some(idx) => host_path.split_at(idx),
            None => (host_path, ""),
        };
        let (user, host) = match authority.rsplit_once('@') {
            Some((user, host)) => (Some(user.split(':').next().unwrap_or(user)), host),
            None => (None, authority),
        };
        Self {
            scheme,
            user,
            host_path,
            normalized: format!("{}{}", host.to_ascii_lowercase(), path),
        }
    }
}

/// Matches request URLs against the ordered `[[auth]]` entries.
#[derive(Debug, Clone, Default)]
pub struct ScopeResolver {
    entries: Vec<ConfigEntry>,
}

impl ScopeResolver {
    pub fn new(entries: Vec<ConfigEntry>) -> Self {
        Self { entries }
    }

    /// Most specific entry for `url`.
    ///
    /// Entries whose username agrees with `url_user` outrank entries that
    /// name somebody else; within a rank the longest prefix wins and the
    /// first declared entry wins ties.
    pub fn find_entry(&self, url: &UnpackedUrl, url_user: Option<&str>) -> Option<&ConfigEntry> {
        let host_path = url.host_path();
        let mut best: Option<((bool, usize), &ConfigEntry)> = None;

        for entry in &self.entries {
            let prefix = entry.prefix.trim();
            let rank_len = if prefix == WILDCARD {
                if !scheme_allowed(entry, None, &url.scheme) {
                    continue;
                }
                WILDCARD.len()
            } else {
                let parsed = ParsedPrefix::parse(prefix);
                if let Some(prefix_user) = parsed.user
                    && url_user != Some(prefix_user)
                {
                    continue;
                }
                if !scheme_allowed(entry, parsed.scheme.as_deref(), &url.scheme) {
                    continue;
                }
                if !host_path.starts_with(&parsed.normalized) {
                    continue;
                }
                parsed.normalized.len()
            };

            let compatible = match (&entry.username, url_user) {
                (Some(config_user), Some(url_user)) => config_user == url_user,
                _ => true,
            };
            let rank = (compatible, rank_len);
            if best.as_ref().is_none_or(|(best_rank, _)| rank > *best_rank) {
                best = Some((rank, entry));
            }
        }

        best.map(|(_, entry)| entry)
    }

    /// Username, static password and scope URL for `url`.
    ///
    /// `username_hint` fills in the username when neither the URL nor the
    /// matched entry provides one. `realm` only labels the error raised when
    /// the URL and the matched entry name different users.
    pub fn resolve(
        &self,
        realm: &str,
        url: &UnpackedUrl,
        username_hint: Option<&str>,
    ) -> Result<ScopeResolution> {
        let url_user = url.username.as_deref();
        // Entries keyed by URL+username are tried with the hint as well
        let entry = self
            .find_entry(url, url_user)
            .or_else(|| match (url_user, username_hint) {
                (None, Some(hint)) => self.find_entry(url, Some(hint)),
                _ => None,
            });

        let (config_user, password, scope_url) = match entry {
            Some(entry) => (
                entry.username.clone(),
                entry.password.clone(),
                scope_url(&url.base_url, &entry.prefix),
            ),
            None => (None, None, url.base_url.clone()),
        };

        if let (Some(url_user), Some(config_user)) = (url_user, config_user.as_deref())
            && url_user != config_user
        {
            return Err(AuthError::AmbiguousCredentialConfig {
                realm: realm.to_string(),
                url: url.base_url.clone(),
                url_user: url_user.to_string(),
                config_user: config_user.to_string(),
            });
        }

        let username = url
            .username
            .clone()
            .or(config_user)
            .or_else(|| username_hint.map(str::to_string));

        debug!(
            scope_url = %scope_url,
            username = username.as_deref().unwrap_or(""),
            password = if password.is_some() { "********" } else { "" },
            entry = entry.map(|e| e.name.as_str()).unwrap_or(""),
            "Resolved credential scope"
        );

        Ok(ScopeResolution {
            username,
            password,
            scope_url,
            entry: entry.map(|e| e.name.clone()),
        })
    }
}

fn scheme_allowed(entry: &ConfigEntry, prefix_scheme: Option<&str>, scheme: &str) -> bool {
    match prefix_scheme {
        Some(prefix_scheme) => prefix_scheme == scheme,
        None if entry.schemes.is_empty() => scheme == DEFAULT_SCHEME,
        None => entry.schemes.iter().any(|s| s.eq_ignore_ascii_case(scheme)),
    }
}

/// Scope URL for `base_url` under `prefix`: the request scheme followed by the
/// prefix without its own scheme. The wildcard keeps the request URL.
pub fn scope_url(base_url: &str, prefix: &str) -> String {
    let prefix = prefix.trim();
    if prefix.is_empty() || prefix == WILDCARD {
        return base_url.to_string();
    }
    let Some((scheme, _)) = base_url.split_once("://") else {
        return base_url.to_string();
    };
    format!("{scheme}://{}", ParsedPrefix::parse(prefix).host_path)
}
