//! Command handlers.

pub mod join;
pub mod networks;
pub mod peers;
pub mod resolve;
pub mod status;
pub mod watch;

use zerolens_config::AuthTokenProvider;
use zerolens_config::token::service_token_path;
use zerolens_core::SyncEngine;

use crate::cli::Command;
use crate::error::CliError;

pub async fn dispatch(
    cmd: Command,
    engine: &SyncEngine,
    provider: &AuthTokenProvider,
) -> Result<(), CliError> {
    match cmd {
        Command::Status => status::handle(engine, provider).await,
        Command::Networks(args) => networks::handle(engine, provider, args).await,
        Command::Join(args) => join::handle(engine, provider, args).await,
        Command::Leave { network_id } => networks::leave(engine, provider, &network_id).await,
        Command::Peers(args) => peers::handle(engine, provider, args).await,
        Command::Resolve { hostname } => resolve::handle(engine, &hostname).await,
        Command::Watch => watch::handle(engine, provider).await,
        // Handled in main before an engine exists.
        Command::Completions(_) => Ok(()),
    }
}

/// Fail early with guidance when a command needs the credential and none
/// was loaded. Queries would stay disabled otherwise, which is the right
/// behavior for a UI but unhelpful for a one-shot command.
pub fn require_credential(
    engine: &SyncEngine,
    provider: &AuthTokenProvider,
) -> Result<(), CliError> {
    if engine.has_auth_token() {
        Ok(())
    } else {
        Err(CliError::NoCredential {
            app_path: provider.path().display().to_string(),
            service_path: service_token_path().display().to_string(),
        })
    }
}

/// Token locations for help text when no provider is at hand.
pub fn token_paths_hint() -> (String, String) {
    let app_path = zerolens_config::load_config_or_default()
        .auth_token_path()
        .map_or_else(
            |_| format!("<config dir>/{}", zerolens_config::AUTHTOKEN_FILENAME),
            |p| p.display().to_string(),
        );
    (app_path, service_token_path().display().to_string())
}
