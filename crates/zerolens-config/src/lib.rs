//! Shared configuration for zerolens consumers.
//!
//! TOML config + `ZEROLENS_`-prefixed environment overrides, platform
//! config paths, the reactive auth-token provider, and process-lifetime
//! app info.

pub mod info;
pub mod token;

use std::path::PathBuf;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

pub use info::AppInfo;
pub use token::{AUTHTOKEN_FILENAME, AuthTokenProvider};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("auth token file not found at {path}")]
    TokenMissing { path: PathBuf },

    #[error("auth token file at {path} is empty")]
    TokenEmpty { path: PathBuf },

    #[error("no config directory available on this platform")]
    NoConfigDir,

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Service host; the real service only listens on loopback.
    #[serde(default = "default_host")]
    pub service_host: String,

    /// Service control port.
    #[serde(default = "default_port")]
    pub service_port: u16,

    /// Override for the auth token file location. Defaults to
    /// `authtoken.secret` under the app config directory.
    pub auth_token_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service_host: default_host(),
            service_port: default_port(),
            auth_token_path: None,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".into()
}

fn default_port() -> u16 {
    9993
}

impl Config {
    /// Base URL of the service per this config.
    pub fn service_url(&self) -> Result<Url, ConfigError> {
        Url::parse(&format!("http://{}:{}", self.service_host, self.service_port)).map_err(|e| {
            ConfigError::Validation {
                field: "service_host/service_port".into(),
                reason: e.to_string(),
            }
        })
    }

    /// Path of the auth token file: the explicit override, or the app
    /// config dir default.
    pub fn auth_token_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(ref path) = self.auth_token_path {
            return Ok(path.clone());
        }
        Ok(app_config_dir().ok_or(ConfigError::NoConfigDir)?.join(AUTHTOKEN_FILENAME))
    }
}

// ── Paths ───────────────────────────────────────────────────────────

/// The app's own config directory, resolved via platform conventions.
pub fn app_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("world", "sargassum", "zerolens")
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    app_config_dir().map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dir| dir.join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("zerolens");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    let path = config_path();

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed("ZEROLENS_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning defaults if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    let path = config_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(&path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn default_service_url_is_loopback() {
        let config = Config::default();
        assert_eq!(
            config.service_url().unwrap().as_str(),
            "http://127.0.0.1:9993/"
        );
    }

    #[test]
    fn explicit_token_path_wins() {
        let config = Config {
            auth_token_path: Some(PathBuf::from("/tmp/tok")),
            ..Config::default()
        };
        assert_eq!(config.auth_token_path().unwrap(), PathBuf::from("/tmp/tok"));
    }
}
