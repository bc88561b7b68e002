//! Request URL normalization.
//!
//! Strips query, fragment and embedded credentials from a request URI so
//! that repeated requests against one endpoint collapse to a single base URL.

use std::borrow::Cow;

use tracing::debug;
use url::Url;

use crate::error::{AuthError, Result};

/// A request URI split into its credential-free base and embedded credentials.
#[derive(Clone, PartialEq, Eq)]
pub struct UnpackedUrl {
    /// URL without query, fragment, username or password
    pub base_url: String,
    pub scheme: String,
    /// Host, with the port when one was given explicitly
    pub host: String,
    pub path: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl UnpackedUrl {
    pub fn parse(authuri: &str) -> Result<Self> {
        let mut url = Url::parse(authuri).map_err(|e| AuthError::InvalidUrl {
            url: authuri.to_string(),
            reason: e.to_string(),
        })?;

        let username = non_empty(url.username()).map(decode);
        let password = url.password().and_then(non_empty).map(decode);

        // Cannot-be-a-base URLs carry no credentials to strip
        let _ = url.set_username("");
        let _ = url.set_password(None);
        url.set_query(None);
        url.set_fragment(None);

        let mut base_url = url.as_str().to_string();
        let without_query = authuri.split(['?', '#']).next().unwrap_or(authuri);
        if url.path() == "/" && !without_query.ends_with('/') && base_url.ends_with('/') {
            base_url.pop();
        }

        let host = match (url.host_str(), url.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => String::new(),
        };

        debug!(
            base_url = %base_url,
            url_user = username.as_deref().unwrap_or(""),
            url_password = if password.is_some() { "******" } else { "" },
            "Unpacked request URL"
        );

        Ok(Self {
            base_url,
            scheme: url.scheme().to_string(),
            host,
            path: url.path().to_string(),
            username,
            password,
        })
    }

    /// Base URL without its `scheme://` part.
    pub fn host_path(&self) -> &str {
        self.base_url
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.base_url)
    }

    /// Both username and password were embedded in the URL.
    pub fn has_full_credentials(&self) -> bool {
        self.username.is_some() && self.password.is_some()
    }
}

impl std::fmt::Debug for UnpackedUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnpackedUrl")
            .field("base_url", &self.base_url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .finish()
    }
}

/// Whether `url` looks like an HTTP(S) endpoint.
pub fn is_http_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn non_empty(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

fn decode(value: &str) -> String {
    urlencoding::decode(value)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| value.to_string())
}
