// ── Core error types ──
//
// User-facing errors from zerolens-core. Consumers never see raw
// reqwest/serde failures; the `From<zerolens_api::Error>` impl translates
// transport-layer outcomes into domain-appropriate variants. These are the
// values captured per cache entry and rendered by the UI layer.

use thiserror::Error;

use crate::model::InvalidNetworkId;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Could not connect to the ZeroTier service: {reason}. Is the service installed and running?")]
    ServiceUnreachable { reason: String },

    #[error("Not authorized to issue requests to the ZeroTier service. Is the auth token correct?")]
    Unauthorized,

    // ── Resource errors ──────────────────────────────────────────────
    #[error("Missing resource at /{route}. Does it still exist?")]
    NotFound { route: String },

    #[error("Unexpected response (HTTP {status}) from the ZeroTier port; some other service may be listening there")]
    UnexpectedService { status: u16 },

    #[error("The service returned an empty record. Is the auth token correct?")]
    EmptyRecord,

    #[error("Malformed service response: {message}")]
    MalformedResponse { message: String },

    // ── Credential / validation errors ───────────────────────────────
    #[error("The ZeroTier auth token is missing")]
    CredentialMissing,

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── DNS errors ───────────────────────────────────────────────────
    #[error("DNS lookup failed for {name}: {message}")]
    DnsLookup { name: String, message: String },

    // ── Mutation errors ──────────────────────────────────────────────
    /// A write operation against the service failed. Never written into
    /// any query cache entry -- returned to the mutation's caller only.
    #[error("{operation} failed: {source}")]
    MutationFailed {
        operation: String,
        #[source]
        source: Box<CoreError>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl CoreError {
    /// Returns `true` if the service itself was unreachable.
    pub fn is_connection_failed(&self) -> bool {
        matches!(self, Self::ServiceUnreachable { .. })
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

// ── Conversion from transport-layer outcomes ─────────────────────────

impl From<zerolens_api::Error> for CoreError {
    fn from(err: zerolens_api::Error) -> Self {
        match err {
            zerolens_api::Error::ConnectionFailed { reason, .. } => {
                CoreError::ServiceUnreachable { reason }
            }
            zerolens_api::Error::Setup { message } => CoreError::Config { message },
            zerolens_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("invalid URL: {e}"),
            },
            zerolens_api::Error::Unauthorized { .. } => CoreError::Unauthorized,
            zerolens_api::Error::NotFound { route, .. } => CoreError::NotFound { route },
            zerolens_api::Error::UnexpectedStatus { status, .. } => {
                CoreError::UnexpectedService { status }
            }
            zerolens_api::Error::EmptyBody { .. } => CoreError::EmptyRecord,
            zerolens_api::Error::CredentialMissing { .. } => CoreError::CredentialMissing,
            zerolens_api::Error::Deserialization { message, .. } => {
                CoreError::MalformedResponse { message }
            }
            zerolens_api::Error::Dns { name, message } => CoreError::DnsLookup { name, message },
        }
    }
}

impl From<InvalidNetworkId> for CoreError {
    fn from(err: InvalidNetworkId) -> Self {
        CoreError::ValidationFailed {
            message: err.to_string(),
        }
    }
}
