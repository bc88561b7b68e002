use anyhow::Result;
use keyward_core::ClearOutcome;
use keyward_core::admin;

use crate::output::{OutputFormat, json::print_json};
use crate::setup::Session;

pub async fn run(session: &Session, path: &str, format: OutputFormat) -> Result<()> {
    let endpoint = session.config.endpoint(path);
    let outcome = admin::clear(&session.resolver, &endpoint).await?;

    if format.is_json() {
        return print_json(&outcome);
    }

    match outcome {
        ClearOutcome::UsernameUnknown { scope_url } => {
            println!("Username not configured for url {scope_url}");
        }
        ClearOutcome::NothingSaved {
            username,
            scope_url,
        } => {
            println!("No password is saved for user {username}, url {scope_url}");
        }
        ClearOutcome::Removed {
            username,
            scope_url,
            source,
        } => {
            if source != keyward_core::CredentialSource::SecretStore {
                println!("Password for user {username}, url {scope_url} comes from {source}, not from the secret store");
            }
            println!("Password removed for user {username}, url {scope_url}");
        }
    }
    Ok(())
}
