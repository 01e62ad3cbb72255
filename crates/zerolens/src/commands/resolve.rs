//! `zerolens resolve` -- look up the network ID published at a hostname.

use zerolens_core::queries::dns::{hostname_from_identifier, is_fqdn};
use zerolens_core::{SyncEngine, network_id_from_txt};

use crate::error::CliError;
use crate::output::{network_id_label, require_success};

pub async fn handle(engine: &SyncEngine, hostname: &str) -> Result<(), CliError> {
    let domain = hostname_from_identifier(hostname);
    if !is_fqdn(&domain) {
        return Err(CliError::Validation {
            field: "hostname",
            reason: format!("'{hostname}' is not a fully-qualified domain name"),
        });
    }

    let mut lookup = engine.txt_records(&domain);
    let result = lookup.ready().await;
    let records = require_success(&result, || CliError::Validation {
        field: "hostname",
        reason: "the lookup was not issued".into(),
    })?;

    match network_id_from_txt(&records) {
        Ok(id) => {
            println!("{domain} publishes network ID {}", network_id_label(&id));
            Ok(())
        }
        Err(e) => Err(CliError::Resolution(e)),
    }
}
