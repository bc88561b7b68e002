use std::path::PathBuf;

use crate::error::{AuthError, Result};

const KEYWARD_DIR: &str = ".keyward";
const CONFIG_DIR: &str = "keyward";
const CONFIG_FILE: &str = "config.toml";
const SECRETS_DB_FILE: &str = "secrets.db";
const LOGS_DIR: &str = "logs";

/// Environment variable to override the keyward data directory.
pub const KEYWARD_DIR_ENV: &str = "KEYWARD_DIR";
/// Environment variable to override the configuration file.
pub const KEYWARD_CONFIG_ENV: &str = "KEYWARD_CONFIG";

/// Resolve the keyward data directory.
/// Priority: KEYWARD_DIR env var > ~/.keyward/
pub fn resolve_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(KEYWARD_DIR_ENV)
        && !dir.trim().is_empty()
    {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|h| h.join(KEYWARD_DIR))
        .ok_or_else(|| AuthError::Config("failed to determine home directory".to_string()))
}

/// Configuration file path.
/// Priority: KEYWARD_CONFIG env var > <config dir>/keyward/config.toml
pub fn config_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var(KEYWARD_CONFIG_ENV)
        && !path.trim().is_empty()
    {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|p| p.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Default database path for the file secret store: ~/.keyward/secrets.db
pub fn secrets_db_path() -> Result<PathBuf> {
    Ok(resolve_data_dir()?.join(SECRETS_DB_FILE))
}

/// Get the logs directory: ~/.keyward/logs/
pub fn logs_dir() -> Result<PathBuf> {
    let dir = resolve_data_dir()?.join(LOGS_DIR);
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}
