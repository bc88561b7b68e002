use colored::Colorize;
use keyward_core::AuthError;

pub fn handle_error(err: anyhow::Error) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), err);

    match err.downcast_ref::<AuthError>() {
        Some(AuthError::AmbiguousCredentialConfig { url_user, .. }) => {
            eprintln!("\n{}", "Suggestion:".yellow().bold());
            eprintln!("  Remove {} from the URL or drop the username from the matching [[auth]] entry.", url_user);
        }
        Some(AuthError::NonInteractiveAuthRequired { url, .. }) => {
            eprintln!("\n{}", "Suggestion:".yellow().bold());
            eprintln!("  Run interactively once to save a password, or configure one for {}:", url);
            eprintln!("  {} keyward get {}", "$".dimmed(), url);
        }
        Some(AuthError::Config(_)) => {
            eprintln!("\n{}", "Suggestion:".yellow().bold());
            eprintln!("  Check the configuration file, or point to another one with --config.");
        }
        Some(AuthError::Store(_)) => {
            eprintln!("\n{}", "Suggestion:".yellow().bold());
            eprintln!("  Try another secret store with --store file or --store memory.");
        }
        _ => {}
    }

    std::process::exit(1);
}
