//! Configuration file support
//!
//! Loads configuration from `$KEYWARD_CONFIG` or `<config dir>/keyward/config.toml`.
//!
//! ```toml
//! [[auth]]
//! name = "example"
//! prefix = "https://example.com/repos"
//! username = "alice"
//!
//! [paths]
//! default = "https://example.com/repos/app"
//!
//! [[path_templates]]
//! dir = "~/src/(group)/{repo}"
//! url = "https://example.com/{group}/{repo:/=-}"
//!
//! [secret_store]
//! backend = "file"
//!
//! [prompt]
//! interactive = false
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use keyward_storage::{DEFAULT_SERVICE, SecretStoreKind, SecretStoreOptions};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::admin::Endpoint;
use crate::error::{AuthError, Result};
use crate::paths;
use crate::pattern::{InvalidPattern, PathPattern};
use crate::template::TextTemplate;

/// One `[[auth]]` entry: credentials bound to a URL prefix.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigEntry {
    /// Group name, used only in diagnostics
    #[serde(default)]
    pub name: String,
    /// URL prefix, with or without scheme; `*` matches everything
    pub prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    /// Schemes accepted when `prefix` has none (default: https)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub schemes: Vec<String>,
}

impl ConfigEntry {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_schemes(mut self, schemes: &[&str]) -> Self {
        self.schemes = schemes.iter().map(|s| s.to_string()).collect();
        self
    }
}

impl std::fmt::Debug for ConfigEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigEntry")
            .field("name", &self.name)
            .field("prefix", &self.prefix)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "********"))
            .field("schemes", &self.schemes)
            .finish()
    }
}

/// `[[path_templates]]` entry mapping a local directory to a remote URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathTemplateConfig {
    pub dir: String,
    pub url: String,
}

/// A compiled path template.
#[derive(Debug, Clone)]
pub struct PathTemplate {
    pub pattern: PathPattern,
    pub url: TextTemplate,
}

impl PathTemplate {
    pub fn compile(config: &PathTemplateConfig) -> std::result::Result<Self, InvalidPattern> {
        Ok(Self {
            pattern: PathPattern::compile(&config.dir)?,
            url: TextTemplate::parse(&config.url)?,
        })
    }

    /// Remote URL for `dir`, if the directory matches this template.
    pub fn resolve(&self, dir: &str) -> Option<String> {
        let captures: HashMap<String, String> = self.pattern.matches(dir)?;
        self.url.fill(&captures)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecretStoreConfig {
    /// keyring, file or memory
    pub backend: Option<SecretStoreKind>,
    /// Keyring service name
    pub service: Option<String>,
    /// Database path for the file backend
    pub path: Option<PathBuf>,
}

impl SecretStoreConfig {
    pub fn to_options(&self) -> Result<SecretStoreOptions> {
        let kind = self.backend.unwrap_or_default();
        let path = match (&self.path, kind) {
            (Some(path), _) => Some(path.clone()),
            (None, SecretStoreKind::File) => Some(paths::secrets_db_path()?),
            (None, _) => None,
        };
        Ok(SecretStoreOptions {
            kind,
            service: self
                .service
                .clone()
                .unwrap_or_else(|| DEFAULT_SERVICE.to_string()),
            path,
        })
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PromptConfig {
    /// External helper program answering credential requests
    pub helper: Option<PathBuf>,
    /// Set to false to never prompt
    pub interactive: Option<bool>,
}

/// Keyward configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeywardConfig {
    /// Credential entries, in declaration order
    #[serde(default)]
    pub auth: Vec<ConfigEntry>,
    /// Named remote endpoints
    #[serde(default)]
    pub paths: BTreeMap<String, String>,
    #[serde(default)]
    pub path_templates: Vec<PathTemplateConfig>,
    #[serde(default)]
    pub secret_store: SecretStoreConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    /// `path_templates` compiled when the file was read
    #[serde(skip)]
    templates: Vec<PathTemplate>,
}

impl KeywardConfig {
    /// Load configuration from `path`, or from the default location.
    ///
    /// A missing file yields the default configuration; a malformed one is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match paths::config_path() {
                Some(path) => path,
                None => return Ok(Self::default()),
            },
        };

        if !path.exists() {
            debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
            .map_err(|e| AuthError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Parse configuration text. Invalid path templates are reported here,
    /// once, and never match afterwards.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: Self =
            toml::from_str(content).map_err(|e| AuthError::Config(e.to_string()))?;
        config.templates = compile_templates(&config.path_templates);
        Ok(config)
    }

    /// The valid path templates, in declaration order.
    pub fn path_templates(&self) -> &[PathTemplate] {
        &self.templates
    }

    /// All named endpoints.
    pub fn endpoints(&self) -> Vec<Endpoint> {
        self.paths
            .iter()
            .map(|(name, url)| Endpoint::new(name, url))
            .collect()
    }

    /// Resolve a command-line argument: an alias from `[paths]`, a local
    /// directory covered by a path template, or a literal URL.
    pub fn endpoint(&self, arg: &str) -> Endpoint {
        if let Some(url) = self.paths.get(arg) {
            return Endpoint::new(arg, url);
        }
        if !arg.contains("://")
            && let Some(url) = self
                .path_templates()
                .iter()
                .find_map(|template| template.resolve(arg))
        {
            return Endpoint::new(arg, url);
        }
        Endpoint::new(arg, arg)
    }
}

fn compile_templates(configs: &[PathTemplateConfig]) -> Vec<PathTemplate> {
    configs
        .iter()
        .filter_map(|config| match PathTemplate::compile(config) {
            Ok(template) => Some(template),
            Err(e) => {
                warn!(dir = %config.dir, error = %e, "Ignoring invalid path template");
                None
            }
        })
        .collect()
}
