//! `zerolens join` -- drive one identifier-resolution/join attempt and
//! print each observed state transition.

use std::time::Duration;

use owo_colors::OwoColorize;

use zerolens_config::AuthTokenProvider;
use zerolens_core::{IdentifierKind, JoinState, NetworkId, SyncEngine};

use crate::cli::JoinArgs;
use crate::error::CliError;
use crate::output::network_id_label;

use super::require_credential;

pub async fn handle(
    engine: &SyncEngine,
    provider: &AuthTokenProvider,
    args: JoinArgs,
) -> Result<(), CliError> {
    require_credential(engine, provider)?;

    let kind = if args.network_id || NetworkId::is_valid(args.identifier.trim()) {
        IdentifierKind::NetworkId
    } else {
        IdentifierKind::DomainName
    };

    // One attempt per command invocation; the at-most-once join guard is
    // tied to this instance.
    let attempt = engine.begin_join();
    let mut rx = attempt.watch();
    let printer = tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let state = rx.borrow_and_update().clone();
            print_transition(&state);
            if state.is_terminal() {
                break;
            }
        }
    });

    let final_state = attempt.submit(&args.identifier, kind).await;
    // The printer converges on the terminal state; don't hang on it.
    let _ = tokio::time::timeout(Duration::from_secs(1), printer).await;

    match final_state {
        JoinState::Joined { id } => {
            println!(
                "Join of {} requested. You will usually need to be authorized by the\n\
                 network's host before you can actually access the network.",
                network_id_label(&id)
            );
            Ok(())
        }
        JoinState::AlreadyJoined { id } => {
            println!(
                "This device has already joined network {}.",
                network_id_label(&id)
            );
            Ok(())
        }
        JoinState::ResolutionFailed { error } => Err(CliError::Resolution(error)),
        JoinState::JoinFailed { error, .. } => Err(CliError::Join {
            message: error.to_string(),
        }),
        other => Err(CliError::Query {
            message: format!("join attempt stopped in a non-terminal state: {other:?}"),
        }),
    }
}

fn print_transition(state: &JoinState) {
    match state {
        JoinState::Submitted { identifier, .. } => {
            println!("{} {identifier}", "submitted:".dimmed());
        }
        JoinState::ResolvingDomain { domain } => {
            println!("{} looking up TXT records for {domain}", "resolving:".dimmed());
        }
        JoinState::NetworkIdKnown { id } => {
            println!("{} {}", "network ID:".dimmed(), network_id_label(id));
        }
        JoinState::Joining { id } => {
            println!("{} {}", "joining:".dimmed(), network_id_label(id));
        }
        _ => {}
    }
}
