// ── Identifier resolution & join state machine ──
//
// Turns a user-supplied identifier (domain name or raw network ID) into a
// confirmed network ID via the DNS TXT query, then drives the join
// mutation. Attempt state is owned by an explicit entity with a generated
// instance identity: constructing a new `JoinAttempt` is the ONE way a
// new attempt begins, and the at-most-once join guard is keyed to that
// instance, not to any rendering lifecycle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;
use tracing::debug;
use uuid::Uuid;

use crate::cache::QueryStatus;
use crate::engine::SyncEngine;
use crate::error::CoreError;
use crate::model::{InvalidNetworkId, NetworkId};
use crate::queries::dns::{hostname_from_identifier, is_fqdn};
use crate::{mutations, queries};

/// Reserved TXT key under which a network ID is published for a domain.
pub const NETWORK_ID_TXT_KEY: &str = "zerotier-net-id";

// ── TXT resolution ───────────────────────────────────────────────────

/// Why a domain name failed to resolve to a network ID. Zero matches,
/// multiple matches, an empty value, and a malformed value are four
/// distinct, user-visible outcomes -- never silently merged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("'{input}' is not a valid fully-qualified domain name")]
    InvalidDomain { input: String },

    #[error("no ZeroTier network ID is published at the hostname")]
    NoRecords,

    #[error("{count} ZeroTier network IDs are published at the hostname; expected exactly one")]
    Ambiguous { count: usize },

    #[error("the ZeroTier network ID published at the hostname is empty")]
    EmptyValue,

    #[error("the value published at the hostname is not a network ID: {0}")]
    Invalid(#[from] InvalidNetworkId),

    #[error("TXT lookup failed: {message}")]
    Lookup { message: String },
}

/// Extract the unique network ID from a set of TXT records.
///
/// Succeeds iff exactly one record starts with `zerotier-net-id=` and the
/// remainder is a non-empty, valid network ID.
pub fn network_id_from_txt(records: &[String]) -> Result<NetworkId, ResolutionError> {
    let prefix = format!("{NETWORK_ID_TXT_KEY}=");
    let matches: Vec<&str> = records
        .iter()
        .filter_map(|record| record.strip_prefix(prefix.as_str()))
        .collect();

    match matches.as_slice() {
        [] => Err(ResolutionError::NoRecords),
        [value] => {
            if value.is_empty() {
                Err(ResolutionError::EmptyValue)
            } else {
                Ok(value.parse()?)
            }
        }
        many => Err(ResolutionError::Ambiguous { count: many.len() }),
    }
}

/// Whether a network's declared name checks out: the name's TXT records
/// publish exactly this network's ID.
pub fn declared_name_verified(records: &[String], id: &NetworkId) -> bool {
    matches!(network_id_from_txt(records), Ok(resolved) if resolved == *id)
}

// ── Attempt state machine ────────────────────────────────────────────

/// How the user said the identifier should be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    DomainName,
    NetworkId,
}

/// Observable state of one join attempt.
#[derive(Debug, Clone)]
pub enum JoinState {
    Idle,
    Submitted {
        identifier: String,
        kind: IdentifierKind,
    },
    ResolvingDomain {
        domain: String,
    },
    NetworkIdKnown {
        id: NetworkId,
    },
    /// The service already has a membership record for this network;
    /// the join mutation is skipped.
    AlreadyJoined {
        id: NetworkId,
    },
    Joining {
        id: NetworkId,
    },
    Joined {
        id: NetworkId,
    },
    ResolutionFailed {
        error: ResolutionError,
    },
    JoinFailed {
        id: NetworkId,
        error: Arc<CoreError>,
    },
}

impl JoinState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::AlreadyJoined { .. }
                | Self::Joined { .. }
                | Self::ResolutionFailed { .. }
                | Self::JoinFailed { .. }
        )
    }
}

/// One join attempt with an explicit instance identity.
///
/// The join mutation fires at most once per attempt instance, no matter
/// how often the attempt is re-observed or `submit` is re-invoked.
/// Restarting the flow means constructing a fresh attempt (see
/// [`SyncEngine::begin_join`]).
pub struct JoinAttempt {
    id: Uuid,
    engine: SyncEngine,
    state: watch::Sender<JoinState>,
    fired: AtomicBool,
}

/// How fast the membership pre-check polls/retains the single-network
/// query; much shorter than the steady-state view wants.
const MEMBERSHIP_CHECK_CACHE: Duration = Duration::from_secs(1);

impl JoinAttempt {
    pub(crate) fn new(engine: &SyncEngine) -> Self {
        let (state, _) = watch::channel(JoinState::Idle);
        Self {
            id: Uuid::new_v4(),
            engine: engine.clone(),
            state,
            fired: AtomicBool::new(false),
        }
    }

    /// This attempt's instance identity.
    pub fn attempt_id(&self) -> Uuid {
        self.id
    }

    /// Observe state transitions.
    pub fn watch(&self) -> watch::Receiver<JoinState> {
        self.state.subscribe()
    }

    /// The current state.
    pub fn current(&self) -> JoinState {
        self.state.borrow().clone()
    }

    /// Submit an identifier and drive the attempt to a terminal state.
    ///
    /// Returns the final state; intermediate transitions are published
    /// through [`watch`](Self::watch).
    pub async fn submit(&self, input: &str, kind: IdentifierKind) -> JoinState {
        self.set(JoinState::Submitted {
            identifier: input.to_owned(),
            kind,
        });

        match kind {
            IdentifierKind::DomainName => self.resolve_and_join(input).await,
            IdentifierKind::NetworkId => match input.trim().parse::<NetworkId>() {
                Ok(id) => self.join(id).await,
                Err(e) => self.fail_resolution(ResolutionError::Invalid(e)),
            },
        }
    }

    async fn resolve_and_join(&self, input: &str) -> JoinState {
        let domain = hostname_from_identifier(input);
        if !is_fqdn(&domain) {
            return self.fail_resolution(ResolutionError::InvalidDomain {
                input: input.to_owned(),
            });
        }

        self.set(JoinState::ResolvingDomain {
            domain: domain.clone(),
        });

        let mut lookup = queries::dns::txt(&self.engine, &domain);
        let result = lookup.ready().await;
        let records = match (result.status, result.data, result.error) {
            (QueryStatus::Success, Some(records), _) => records,
            (QueryStatus::Error, _, Some(error)) => {
                return self.fail_resolution(ResolutionError::Lookup {
                    message: error.to_string(),
                });
            }
            _ => {
                return self.fail_resolution(ResolutionError::InvalidDomain {
                    input: input.to_owned(),
                });
            }
        };

        match network_id_from_txt(&records) {
            Ok(id) => self.join(id).await,
            Err(e) => self.fail_resolution(e),
        }
    }

    async fn join(&self, id: NetworkId) -> JoinState {
        self.set(JoinState::NetworkIdKnown { id: id.clone() });

        // The service may already hold a membership record; skip the
        // mutation then and report that instead of re-joining.
        let mut membership =
            self.engine
                .network_with(&id, None, Some(MEMBERSHIP_CHECK_CACHE));
        let current = membership.ready().await;
        if current
            .data
            .as_ref()
            .is_some_and(|network| network.id == id.as_str())
            && current.is_success()
        {
            return self.set(JoinState::AlreadyJoined { id });
        }

        // At most once per attempt instance, across every code path.
        if self.fired.swap(true, Ordering::SeqCst) {
            debug!(attempt = %self.id, "join already fired for this attempt");
            return self.current();
        }

        self.set(JoinState::Joining { id: id.clone() });
        match mutations::join_network(&self.engine, &id).await {
            Ok(_) => self.set(JoinState::Joined { id }),
            Err(e) => self.set(JoinState::JoinFailed {
                id,
                error: Arc::new(e),
            }),
        }
    }

    fn fail_resolution(&self, error: ResolutionError) -> JoinState {
        self.set(JoinState::ResolutionFailed { error })
    }

    fn set(&self, state: JoinState) -> JoinState {
        debug!(attempt = %self.id, state = ?state, "join attempt transition");
        self.state.send_replace(state.clone());
        state
    }
}
