//! `zerolens status` -- service reachability plus node identity.

use owo_colors::OwoColorize;

use zerolens_config::{AppInfo, AuthTokenProvider};
use zerolens_core::{ApiHealth, SyncEngine};

use crate::error::CliError;
use crate::output::require_success;

pub async fn handle(engine: &SyncEngine, provider: &AuthTokenProvider) -> Result<(), CliError> {
    let info = AppInfo::get();
    println!("zerolens {} ({}/{})", info.version, info.platform, info.arch);

    // Credential-independent probe first: it distinguishes "service down"
    // from "credential problem" before anything else is attempted.
    let mut probe = engine.api_health();
    let health = probe.ready().await;
    match health.data.as_deref().copied() {
        Some(ApiHealth::Confirmed) => {
            println!("service:  {}", "reachable".green());
        }
        Some(ApiHealth::IncorrectService { status }) => {
            println!(
                "service:  {}",
                format!("unexpected responder (HTTP {status}) -- another program may be using the ZeroTier port").red()
            );
            return Ok(());
        }
        Some(ApiHealth::Unreachable) | None => {
            println!(
                "service:  {}",
                "unreachable -- is the ZeroTier service installed and running?".red()
            );
            return Ok(());
        }
    }

    if !engine.has_auth_token() {
        // Neutral idle state, not an error: the node query is disabled
        // until a credential appears.
        println!("token:    {}", "not loaded".yellow());
        println!("          expected at: {}", provider.path().display());
        println!(
            "          copy it from: {} (administrator permissions usually required)",
            zerolens_config::token::service_token_path().display()
        );
        return Ok(());
    }
    println!("token:    loaded from {}", provider.path().display());

    let mut node = engine.node_status();
    let result = node.ready().await;
    let node = require_success(&result, || CliError::Query {
        message: "node status query did not settle".into(),
    })?;

    let liveness = if node.online {
        if node.tcp_fallback_active {
            "online (slow TCP fallback)".yellow().to_string()
        } else {
            "online".green().to_string()
        }
    } else {
        "offline".red().to_string()
    };
    println!("node:     {} ({liveness})", node.address);
    println!("version:  {}", node.version);
    Ok(())
}
