use thiserror::Error;

/// Top-level error type for the `zerolens-api` crate.
///
/// Every request against the local service is classified into exactly one
/// of these outcomes. `zerolens-core` maps them into user-facing
/// diagnostics; nothing above this crate ever sees a raw `reqwest` error.
#[derive(Debug, Error)]
pub enum Error {
    // ── Transport ───────────────────────────────────────────────────
    /// The service could not be reached at all (not running, wrong port).
    #[error("Could not connect to the ZeroTier service ({method} /{route}): {reason}. Is it running?")]
    ConnectionFailed {
        method: String,
        route: String,
        reason: String,
    },

    /// Building the underlying HTTP client failed.
    #[error("HTTP client setup failed: {message}")]
    Setup { message: String },

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ── Service responses ───────────────────────────────────────────
    /// HTTP 401 -- the auth token is missing, stale, or wrong.
    #[error("Not authorized to issue requests to the ZeroTier service ({method} /{route}). Is the auth token correct?")]
    Unauthorized { method: String, route: String },

    /// HTTP 404 -- the requested sub-resource does not exist.
    #[error("Missing resource ({method} /{route}). Is the resource nonexistent?")]
    NotFound { method: String, route: String },

    /// Any other non-200 status. Usually means some unrelated service is
    /// squatting on the ZeroTier port.
    #[error("Unexpected HTTP response code {status} ({method} /{route}). Is some other service running on the ZeroTier port?")]
    UnexpectedStatus {
        status: u16,
        method: String,
        route: String,
    },

    /// Status 200 with an empty JSON object body, on a route where that
    /// indicates a subtly wrong credential.
    #[error("Unexpected empty response ({method} /{route}). Is the auth token correct?")]
    EmptyBody { method: String, route: String },

    /// A credential-requiring request was issued without one. Callers
    /// normally prevent this by disabling queries while the token is absent.
    #[error("Missing ZeroTier auth token for {method} /{route}")]
    CredentialMissing { method: String, route: String },

    // ── Data ────────────────────────────────────────────────────────
    /// The response body did not match the expected shape.
    #[error("Deserialization error ({method} /{route}): {message}")]
    Deserialization {
        method: String,
        route: String,
        message: String,
    },

    // ── DNS ─────────────────────────────────────────────────────────
    /// A DNS lookup failed. Distinct from "no records found", which is a
    /// successful lookup with an empty record set.
    #[error("DNS lookup failed for {name}: {message}")]
    Dns { name: String, message: String },
}

impl Error {
    /// Returns `true` if the service itself was unreachable.
    pub fn is_connection_failed(&self) -> bool {
        matches!(self, Self::ConnectionFailed { .. })
    }

    /// Returns `true` if the service rejected the credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` if the requested sub-resource does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
