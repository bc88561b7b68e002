//! CLI setup module
//!
//! Builds the credential resolver from configuration and command-line flags.

use std::sync::Arc;

use anyhow::Result;
use keyward_core::{
    AuthError, CredentialResolver, HelperPrompt, InteractivePrompt, KeywardConfig, NonInteractive,
    ScopeResolver, TerminalPrompt,
};
use keyward_storage::{SecretStoreKind, open_secret_store};
use tracing::debug;

use crate::cli::{Cli, StoreBackend};

/// Configuration plus the resolver built from it, for one command.
pub struct Session {
    pub config: KeywardConfig,
    pub resolver: CredentialResolver,
}

impl From<StoreBackend> for SecretStoreKind {
    fn from(backend: StoreBackend) -> Self {
        match backend {
            StoreBackend::Keyring => SecretStoreKind::Keyring,
            StoreBackend::File => SecretStoreKind::File,
            StoreBackend::Memory => SecretStoreKind::Memory,
        }
    }
}

pub fn prepare_session(cli: &Cli) -> Result<Session> {
    let config = KeywardConfig::load(cli.config.as_deref())?;

    let mut store_config = config.secret_store.clone();
    if let Some(backend) = cli.store {
        store_config.backend = Some(backend.into());
    }
    let store = open_secret_store(store_config.to_options()?).map_err(AuthError::from)?;
    debug!(store = store.name(), "Opened secret store");

    let prompt = select_prompt(cli, &config);
    let resolver = CredentialResolver::new(ScopeResolver::new(config.auth.clone()), store, prompt);

    Ok(Session { config, resolver })
}

fn select_prompt(cli: &Cli, config: &KeywardConfig) -> Arc<dyn InteractivePrompt> {
    if cli.non_interactive || config.prompt.interactive == Some(false) {
        return Arc::new(NonInteractive);
    }
    match HelperPrompt::locate(config.prompt.helper.as_deref()) {
        Some(helper) => {
            debug!(helper = %helper.program().display(), "Using credential helper");
            Arc::new(helper)
        }
        None => Arc::new(TerminalPrompt::new()),
    }
}
