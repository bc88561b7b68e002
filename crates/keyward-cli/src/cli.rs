use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_complete::Shell;

/// Output format for CLI commands
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

impl OutputFormat {
    pub fn is_json(self) -> bool {
        matches!(self, OutputFormat::Json)
    }
}

/// Secret store backend override
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreBackend {
    /// OS keychain
    Keyring,
    /// Database file in the keyward data directory
    File,
    /// Process memory only, nothing is persisted
    Memory,
}

#[derive(Parser)]
#[command(name = "keyward")]
#[command(version, about = "Keyward - saved credentials for HTTP and SMTP endpoints")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to <config dir>/keyward/config.toml)
    #[arg(long, global = true, env = "KEYWARD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Secret store backend, overriding the configuration
    #[arg(long, global = true, value_enum)]
    pub store: Option<StoreBackend>,

    /// Never prompt for credentials
    #[arg(long, global = true)]
    pub non_interactive: bool,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show whether a password is available for each path
    ///
    /// Without arguments every path in the [paths] section is checked;
    /// non-HTTP paths are skipped.
    Check {
        /// Path aliases, local directories or URLs
        paths: Vec<String>,
    },

    /// Drop the saved password for a path
    Clear {
        /// Path alias, local directory or URL
        path: String,
    },

    /// Resolve credentials for a URL, prompting when needed
    Get {
        /// Path alias, local directory or URL
        url: String,

        /// Authentication realm (defaults to the path as given)
        #[arg(long)]
        realm: Option<String>,
    },

    /// Generate shell completions
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}
