//! Network command handlers.

use std::sync::Arc;

use tabled::Tabled;

use zerolens_config::AuthTokenProvider;
use zerolens_core::queries::dns::is_fqdn;
use zerolens_core::{CoreError, NetworkId, NetworkInfo, NetworkType, SyncEngine, declared_name_verified};

use crate::cli::{NetworksArgs, NetworksCommand};
use crate::error::CliError;
use crate::output::{
    classify_core_error, network_id_label, network_status_label, print_table, require_success,
};

use super::require_credential;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct NetworkRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Type")]
    net_type: String,
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Addresses")]
    addresses: String,
}

impl From<&NetworkInfo> for NetworkRow {
    fn from(n: &NetworkInfo) -> Self {
        let id = n
            .id
            .parse::<NetworkId>()
            .map_or_else(|_| n.id.clone(), |id| network_id_label(&id));
        Self {
            id,
            name: n.name.clone(),
            status: network_status_label(n.status),
            net_type: match n.network_type {
                NetworkType::Public => "public".into(),
                NetworkType::Private => "private".into(),
            },
            device: n.port_device_name.clone(),
            addresses: n.assigned_addresses.join(", "),
        }
    }
}

// ── Handlers ────────────────────────────────────────────────────────

pub async fn handle(
    engine: &SyncEngine,
    provider: &AuthTokenProvider,
    args: NetworksArgs,
) -> Result<(), CliError> {
    match args.command.unwrap_or(NetworksCommand::List) {
        NetworksCommand::List => list(engine, provider).await,
        NetworksCommand::Show { network_id } => show(engine, provider, &network_id).await,
    }
}

async fn list(engine: &SyncEngine, provider: &AuthTokenProvider) -> Result<(), CliError> {
    require_credential(engine, provider)?;

    let mut query = engine.networks();
    let result = query.ready().await;
    let networks = require_success(&result, || CliError::Query {
        message: "network list query did not settle".into(),
    })?;

    if networks.is_empty() {
        println!("No joined networks.");
        return Ok(());
    }
    print_table(networks.iter().map(NetworkRow::from));
    Ok(())
}

async fn show(
    engine: &SyncEngine,
    provider: &AuthTokenProvider,
    raw_id: &str,
) -> Result<(), CliError> {
    require_credential(engine, provider)?;

    let id: NetworkId = raw_id.trim().parse().map_err(|e: zerolens_core::InvalidNetworkId| {
        CliError::Validation {
            field: "network ID",
            reason: e.to_string(),
        }
    })?;

    let mut query = engine.network(&id);
    let result = query.ready().await;
    if result.error.as_deref().is_some_and(CoreError::is_not_found) {
        return Err(CliError::NotFound {
            resource: "network",
            identifier: id.to_string(),
        });
    }
    let network = require_success(&result, || CliError::Query {
        message: "network query did not settle".into(),
    })?;

    print_detail(engine, &id, &network).await;
    Ok(())
}

async fn print_detail(engine: &SyncEngine, id: &NetworkId, network: &Arc<NetworkInfo>) {
    println!("ID:        {}", network_id_label(id));
    println!("Name:      {}", render_name(engine, id, &network.name).await);
    println!("Status:    {}", network_status_label(network.status));
    println!(
        "Type:      {}",
        match network.network_type {
            NetworkType::Public => "public",
            NetworkType::Private => "private",
        }
    );
    println!("Device:    {}", network.port_device_name);
    println!("MTU:       {}", network.mtu);
    println!("Bridge:    {}", network.bridge);

    if network.assigned_addresses.is_empty() {
        println!("Addresses: {}", unknown_if_unauthorized(network));
    } else {
        println!("Addresses: {}", network.assigned_addresses.join(", "));
    }

    if network.routes.is_empty() {
        println!("Routes:    {}", unknown_if_unauthorized(network));
    } else {
        for route in &network.routes {
            match &route.via {
                Some(via) => println!("Route:     {} via {via}", route.target),
                None => println!("Route:     {} (local)", route.target),
            }
        }
    }
}

/// Declared names are only trustworthy when the name's own TXT records
/// publish this network's ID; check when the name looks like a domain.
async fn render_name(engine: &SyncEngine, id: &NetworkId, name: &str) -> String {
    if name.is_empty() {
        return "(none declared)".into();
    }
    if !is_fqdn(name) {
        return name.to_owned();
    }

    let mut lookup = engine.txt_records(name);
    let result = lookup.ready().await;
    match result.data {
        Some(records) if declared_name_verified(&records, id) => {
            format!("{name} (verified via DNS)")
        }
        Some(_) => format!("{name} (not verified by DNS)"),
        None => name.to_owned(),
    }
}

fn unknown_if_unauthorized(network: &NetworkInfo) -> &'static str {
    if network.status == zerolens_core::NetworkStatus::Ok {
        "(none)"
    } else {
        "(unknown until authorized)"
    }
}

pub async fn leave(
    engine: &SyncEngine,
    provider: &AuthTokenProvider,
    raw_id: &str,
) -> Result<(), CliError> {
    require_credential(engine, provider)?;

    let id: NetworkId = raw_id.trim().parse().map_err(|e: zerolens_core::InvalidNetworkId| {
        CliError::Validation {
            field: "network ID",
            reason: e.to_string(),
        }
    })?;

    match engine.leave_network(&id).await {
        Ok(()) => {
            println!("Left network {}.", network_id_label(&id));
            Ok(())
        }
        Err(CoreError::MutationFailed { source, .. }) if source.is_not_found() => {
            Err(CliError::NotFound {
                resource: "network",
                identifier: id.to_string(),
            })
        }
        Err(e) => Err(classify_core_error(e)),
    }
}
