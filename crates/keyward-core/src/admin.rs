//! Administrative queries: report and drop saved passwords.

use keyward_storage::SecretKey;
use serde::Serialize;
use tracing::debug;

use crate::endpoint::is_http_url;
use crate::error::{AuthError, Result};
use crate::resolver::CredentialResolver;
use crate::types::CredentialSource;

/// A named remote location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Endpoint {
    pub name: String,
    pub url: String,
}

impl Endpoint {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    pub fn is_http(&self) -> bool {
        is_http_url(&self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EndpointStatus {
    NonHttp,
    /// A password would be used without prompting
    Available {
        source: CredentialSource,
        username: Option<String>,
        scope_url: String,
    },
    /// Username known; a password entered later will be saved for it
    UserOnly { username: String, scope_url: String },
    /// Neither password nor username known
    Unknown { scope_url: String },
    Failed { message: String },
}

impl EndpointStatus {
    pub fn is_failure(&self) -> bool {
        matches!(self, EndpointStatus::NonHttp | EndpointStatus::Failed { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EndpointReport {
    #[serde(flatten)]
    pub endpoint: Endpoint,
    #[serde(flatten)]
    pub status: EndpointStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ClearOutcome {
    UsernameUnknown { scope_url: String },
    NothingSaved { username: String, scope_url: String },
    /// `source` tells where the password had been found before removal
    Removed {
        username: String,
        scope_url: String,
        source: CredentialSource,
    },
}

/// Password status of each endpoint.
///
/// Non-HTTP endpoints are reported when `explicit` (the user named them),
/// and skipped otherwise.
pub async fn check(
    resolver: &CredentialResolver,
    endpoints: &[Endpoint],
    explicit: bool,
) -> Vec<EndpointReport> {
    let mut reports = Vec::with_capacity(endpoints.len());
    for endpoint in endpoints {
        if !endpoint.is_http() {
            if explicit {
                reports.push(EndpointReport {
                    endpoint: endpoint.clone(),
                    status: EndpointStatus::NonHttp,
                });
            }
            continue;
        }

        let status = match resolver.describe(&endpoint.name, &endpoint.url).await {
            Ok(report) => match (report.source, report.username) {
                (Some(source), username) if report.password.is_some() => EndpointStatus::Available {
                    source,
                    username,
                    scope_url: report.scope_url,
                },
                (_, Some(username)) => EndpointStatus::UserOnly {
                    username,
                    scope_url: report.scope_url,
                },
                (_, None) => EndpointStatus::Unknown {
                    scope_url: report.scope_url,
                },
            },
            Err(e) => EndpointStatus::Failed {
                message: e.to_string(),
            },
        };
        debug!(endpoint = %endpoint.name, status = ?status, "Checked endpoint");
        reports.push(EndpointReport {
            endpoint: endpoint.clone(),
            status,
        });
    }
    reports
}

/// Remove the saved password for `endpoint`.
pub async fn clear(resolver: &CredentialResolver, endpoint: &Endpoint) -> Result<ClearOutcome> {
    if !endpoint.is_http() {
        return Err(AuthError::InvalidUrl {
            url: endpoint.url.clone(),
            reason: format!("{} is not an http path", endpoint.name),
        });
    }

    let report = resolver.describe(&endpoint.name, &endpoint.url).await?;
    let Some(username) = report.username else {
        return Ok(ClearOutcome::UsernameUnknown {
            scope_url: report.scope_url,
        });
    };
    let (Some(_), Some(source)) = (report.password, report.source) else {
        return Ok(ClearOutcome::NothingSaved {
            username,
            scope_url: report.scope_url,
        });
    };

    resolver
        .store()
        .clear(&SecretKey::http(&report.scope_url, &username))
        .await?;
    debug!(username = %username, url = %report.scope_url, "Removed saved password");

    Ok(ClearOutcome::Removed {
        username,
        scope_url: report.scope_url,
        source,
    })
}
