//! Peer command handlers.

use tabled::Tabled;

use zerolens_config::AuthTokenProvider;
use zerolens_core::{CoreError, PeerInfo, SyncEngine};

use crate::cli::{PeersArgs, PeersCommand};
use crate::error::CliError;
use crate::output::{epoch_ms_label, peer_role_label, print_table, require_success};

use super::require_credential;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PeerRow {
    #[tabled(rename = "Address")]
    address: String,
    #[tabled(rename = "Role")]
    role: &'static str,
    #[tabled(rename = "Latency")]
    latency: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Paths")]
    paths: usize,
}

impl From<&PeerInfo> for PeerRow {
    fn from(p: &PeerInfo) -> Self {
        Self {
            address: p.address.clone(),
            role: peer_role_label(p.role),
            latency: p
                .known_latency()
                .map_or_else(|| "?".into(), |ms| format!("{ms} ms")),
            version: if p.version_major < 0 {
                "?".into()
            } else {
                p.version.clone()
            },
            paths: p.paths.len(),
        }
    }
}

#[derive(Tabled)]
struct PathRow {
    #[tabled(rename = "Endpoint")]
    endpoint: String,
    #[tabled(rename = "State")]
    state: String,
    #[tabled(rename = "Last Send")]
    last_send: String,
    #[tabled(rename = "Last Receive")]
    last_receive: String,
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(
    engine: &SyncEngine,
    provider: &AuthTokenProvider,
    args: PeersArgs,
) -> Result<(), CliError> {
    match args.command.unwrap_or(PeersCommand::List) {
        PeersCommand::List => list(engine, provider).await,
        PeersCommand::Show { address } => show(engine, provider, &address).await,
    }
}

async fn list(engine: &SyncEngine, provider: &AuthTokenProvider) -> Result<(), CliError> {
    require_credential(engine, provider)?;

    let mut query = engine.peers();
    let result = query.ready().await;
    let peers = require_success(&result, || CliError::Query {
        message: "peer list query did not settle".into(),
    })?;

    if peers.is_empty() {
        println!("No known peers.");
        return Ok(());
    }
    print_table(peers.iter().map(PeerRow::from));
    Ok(())
}

async fn show(
    engine: &SyncEngine,
    provider: &AuthTokenProvider,
    address: &str,
) -> Result<(), CliError> {
    require_credential(engine, provider)?;

    let mut query = engine.peer(address.trim());
    let result = query.ready().await;
    if result.error.as_deref().is_some_and(CoreError::is_not_found) {
        return Err(CliError::NotFound {
            resource: "peer",
            identifier: address.to_owned(),
        });
    }
    let peer = require_success(&result, || CliError::Query {
        message: "peer query did not settle".into(),
    })?;

    println!("Address: {}", peer.address);
    println!("Role:    {}", peer_role_label(peer.role));
    println!(
        "Latency: {}",
        peer.known_latency()
            .map_or_else(|| "unknown".into(), |ms| format!("{ms} ms"))
    );
    if peer.version_major >= 0 {
        println!("Version: {}", peer.version);
    }

    if peer.paths.is_empty() {
        println!("No known paths.");
        return Ok(());
    }
    let rows = peer.paths.iter().map(|path| PathRow {
        endpoint: path.address.clone(),
        state: path_state(path.active, path.preferred, path.expired),
        last_send: epoch_ms_label(path.last_send),
        last_receive: epoch_ms_label(path.last_receive),
    });
    print_table(rows);
    Ok(())
}

fn path_state(active: bool, preferred: bool, expired: bool) -> String {
    if expired {
        "expired".into()
    } else if preferred {
        "preferred".into()
    } else if active {
        "active".into()
    } else {
        "idle".into()
    }
}
