use anyhow::Result;
use keyward_core::RequestIdentity;

use crate::output::{OutputFormat, json::print_json};
use crate::setup::Session;

pub async fn run(
    session: &Session,
    url: &str,
    realm: Option<String>,
    format: OutputFormat,
) -> Result<()> {
    let endpoint = session.config.endpoint(url);
    let realm = realm.unwrap_or_else(|| endpoint.name.clone());

    let credential = session
        .resolver
        .authenticate(&realm, &endpoint.url, Some(RequestIdentity::new()))
        .await?;

    if format.is_json() {
        return print_json(&serde_json::json!({
            "username": credential.username,
            "password": credential.password,
            "source": credential.source,
            "scope_url": credential.scope_url,
        }));
    }

    println!("username={}", credential.username);
    println!("password={}", credential.password);
    Ok(())
}
