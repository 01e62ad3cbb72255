//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and resolution failures into user-facing errors with
//! actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use zerolens_core::{CoreError, ResolutionError};

/// Exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONNECTION: i32 = 7;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the ZeroTier service: {reason}")]
    #[diagnostic(
        code(zerolens::connection_failed),
        help(
            "Check that the ZeroTier service is installed and running.\n\
             Probe the port with: zerolens status"
        )
    )]
    ConnectionFailed { reason: String },

    // ── Credentials ──────────────────────────────────────────────────
    #[error("No auth token available")]
    #[diagnostic(
        code(zerolens::no_credential),
        help(
            "Expected the token at: {app_path}\n\
             Copy it from (probably) {service_path} -- you will need\n\
             administrator permissions to read that file."
        )
    )]
    NoCredential {
        app_path: String,
        service_path: String,
    },

    #[error("The ZeroTier service rejected the auth token")]
    #[diagnostic(
        code(zerolens::unauthorized),
        help(
            "The token at {app_path} is stale or wrong.\n\
             Copy a fresh one from {service_path}."
        )
    )]
    Unauthorized {
        app_path: String,
        service_path: String,
    },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource} '{identifier}' not found")]
    #[diagnostic(code(zerolens::not_found))]
    NotFound {
        resource: &'static str,
        identifier: String,
    },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid {field}: {reason}")]
    #[diagnostic(code(zerolens::validation))]
    Validation { field: &'static str, reason: String },

    #[error("Could not resolve a network ID: {0}")]
    #[diagnostic(
        code(zerolens::resolution),
        help(
            "The hostname must publish exactly one TXT record of the form\n\
             zerotier-net-id=<16 hex characters>."
        )
    )]
    Resolution(ResolutionError),

    // ── Operations ───────────────────────────────────────────────────
    #[error("Join attempt failed: {message}")]
    #[diagnostic(code(zerolens::join_failed))]
    Join { message: String },

    /// A settled query ended in its error state.
    #[error("{message}")]
    #[diagnostic(code(zerolens::query_failed))]
    Query { message: String },

    #[error(transparent)]
    #[diagnostic(code(zerolens::core))]
    Core(#[from] CoreError),

    #[error(transparent)]
    #[diagnostic(code(zerolens::config))]
    Config(#[from] zerolens_config::ConfigError),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::NoCredential { .. } | Self::Unauthorized { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Core(e) if e.is_connection_failed() => exit_code::CONNECTION,
            Self::Core(e) if e.is_unauthorized() => exit_code::AUTH,
            Self::Core(e) if e.is_not_found() => exit_code::NOT_FOUND,
            _ => exit_code::GENERAL,
        }
    }
}
