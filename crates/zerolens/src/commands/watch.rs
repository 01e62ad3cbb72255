//! `zerolens watch` -- stream node and network changes from the polling
//! queries until interrupted.

use owo_colors::OwoColorize;

use zerolens_config::AuthTokenProvider;
use zerolens_core::{QueryStatus, SyncEngine};

use crate::error::CliError;
use crate::output::network_status_label;

use super::require_credential;

pub async fn handle(engine: &SyncEngine, provider: &AuthTokenProvider) -> Result<(), CliError> {
    require_credential(engine, provider)?;

    let mut node = engine.node_status();
    let mut networks = engine.networks();
    println!("Watching the service; press Ctrl-C to exit.");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            result = node.changed() => {
                match result.status {
                    QueryStatus::Success => {
                        if let Some(node) = result.data {
                            let liveness = if node.online { "online".green().to_string() } else { "offline".red().to_string() };
                            println!("node {} is {liveness}", node.address);
                        }
                    }
                    QueryStatus::Error => {
                        if let Some(error) = result.error {
                            println!("node status: {}", error.to_string().red());
                        }
                    }
                    QueryStatus::Pending | QueryStatus::Disabled => {}
                }
            }
            result = networks.changed() => {
                if let Some(networks) = result.data {
                    let summary: Vec<String> = networks
                        .iter()
                        .map(|n| format!("{} {}", n.id, network_status_label(n.status)))
                        .collect();
                    if summary.is_empty() {
                        println!("networks: none joined");
                    } else {
                        println!("networks: {}", summary.join(", "));
                    }
                }
            }
        }
    }
    Ok(())
}
