//! Rendering helpers shared by the command handlers.

use std::sync::Arc;

use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use zerolens_core::{CoreError, NetworkId, NetworkStatus, PeerRole, QueryResult, QueryStatus};

use crate::error::CliError;

/// Render rows as a table on stdout.
pub fn print_table<T: Tabled>(rows: impl IntoIterator<Item = T>) {
    let mut table = Table::new(rows);
    table.with(Style::sharp());
    println!("{table}");
}

/// A network ID with its positional split made visible:
/// `1c33c1ced0` (host address) + `15c144` (network number).
pub fn network_id_label(id: &NetworkId) -> String {
    format!("{}{}", id.host_address().blue(), id.network_number().cyan())
}

pub fn network_status_label(status: NetworkStatus) -> String {
    match status {
        NetworkStatus::Ok => "authorized".green().to_string(),
        NetworkStatus::RequestingConfiguration => "requesting configuration".yellow().to_string(),
        NetworkStatus::AccessDenied => "access denied".red().to_string(),
        NetworkStatus::NotFound => "not found".red().to_string(),
        NetworkStatus::PortError => "port error".red().to_string(),
        NetworkStatus::ClientTooOld => "client too old".red().to_string(),
    }
}

pub fn peer_role_label(role: PeerRole) -> &'static str {
    match role {
        PeerRole::Leaf => "leaf",
        PeerRole::Upstream => "upstream",
        PeerRole::Root => "root",
        PeerRole::Planet => "planet",
        PeerRole::Moon => "moon",
    }
}

/// Epoch-millisecond timestamps from peer paths; `0` means never.
pub fn epoch_ms_label(ms: i64) -> String {
    if ms <= 0 {
        return "never".into();
    }
    chrono::DateTime::from_timestamp_millis(ms).map_or_else(
        || "invalid".into(),
        |t| t.format("%Y-%m-%d %H:%M:%S").to_string(),
    )
}

/// Unwrap a settled query result into its success data, translating the
/// other renderable states into CLI errors. `on_idle` supplies the error
/// for the disabled/loading case (usually: credential missing).
pub fn require_success<T>(
    result: &QueryResult<T>,
    on_idle: impl FnOnce() -> CliError,
) -> Result<Arc<T>, CliError> {
    match result.status {
        QueryStatus::Success => result.data.clone().ok_or_else(on_idle),
        QueryStatus::Disabled | QueryStatus::Pending => Err(on_idle()),
        QueryStatus::Error => Err(classify_query_error(result.error.as_deref())),
    }
}

/// Map a cache-held error into a CLI error with the right help text and
/// exit code.
pub fn classify_query_error(error: Option<&CoreError>) -> CliError {
    match error {
        Some(e) if e.is_connection_failed() => CliError::ConnectionFailed {
            reason: e.to_string(),
        },
        Some(e) if e.is_unauthorized() => {
            let (app_path, service_path) = crate::commands::token_paths_hint();
            CliError::Unauthorized {
                app_path,
                service_path,
            }
        }
        Some(e) => CliError::Query {
            message: e.to_string(),
        },
        None => CliError::Query {
            message: "query failed without an error value".into(),
        },
    }
}

/// Same classification for owned mutation errors.
pub fn classify_core_error(error: CoreError) -> CliError {
    if error.is_connection_failed() {
        CliError::ConnectionFailed {
            reason: error.to_string(),
        }
    } else if error.is_unauthorized() {
        let (app_path, service_path) = crate::commands::token_paths_hint();
        CliError::Unauthorized {
            app_path,
            service_path,
        }
    } else {
        CliError::Core(error)
    }
}
