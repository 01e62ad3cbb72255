mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use zerolens_config::AuthTokenProvider;
use zerolens_core::{EngineConfig, SyncEngine};

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Completions don't need an engine
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "zerolens", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let (engine, provider) = build_engine(&cli.global)?;
            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &engine, &provider).await;
            engine.shutdown();
            result
        }
    }
}

/// Build the sync engine and credential provider from config + CLI flags.
///
/// A missing or unreadable token is not fatal here: queries that need a
/// credential stay in their disabled state and the commands explain what
/// to fix.
fn build_engine(global: &cli::GlobalOpts) -> Result<(SyncEngine, AuthTokenProvider), CliError> {
    let cfg = zerolens_config::load_config_or_default();

    let engine_config = EngineConfig {
        service_url: cfg.service_url()?,
        ..EngineConfig::default()
    };
    let engine = SyncEngine::with_system_resolver(engine_config)?;

    let token_path = match global.token_path.clone() {
        Some(path) => path,
        None => cfg.auth_token_path()?,
    };
    let provider = AuthTokenProvider::new(token_path);
    match provider.reload() {
        Ok(token) => engine.set_auth_token(Some(token)),
        Err(e) => {
            tracing::debug!(error = %e, "no auth token available");
        }
    }

    Ok((engine, provider))
}
