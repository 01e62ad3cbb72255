//! Reactive auth-token provider.
//!
//! The service credential is an opaque bearer token stored in an
//! `authtoken.secret` file. The service's own copy is root-readable, so
//! the expected setup is a user-readable copy under the app config
//! directory; this module reads that copy and re-emits over a watch
//! channel whenever it is reloaded. An absent or empty file means "no
//! credential" -- queries stay disabled, they do not error.

use std::path::{Path, PathBuf};

use secrecy::SecretString;
use tokio::sync::watch;
use tracing::debug;

use crate::ConfigError;

/// File name of the service auth token, both at the service's config
/// directory and in the app's own copy.
pub const AUTHTOKEN_FILENAME: &str = "authtoken.secret";

/// Default service-side config directory for this platform. The token
/// there usually requires administrator permissions to copy out.
pub fn service_config_dir() -> PathBuf {
    if cfg!(target_os = "macos") {
        PathBuf::from("/Library/Application Support/ZeroTier/One/")
    } else if cfg!(target_os = "windows") {
        PathBuf::from("\\ProgramData\\ZeroTier\\One\\")
    } else {
        PathBuf::from("/var/lib/zerotier-one/")
    }
}

/// Where the service keeps its own auth token.
pub fn service_token_path() -> PathBuf {
    service_config_dir().join(AUTHTOKEN_FILENAME)
}

/// Reads the auth token file and re-emits the credential reactively.
pub struct AuthTokenProvider {
    path: PathBuf,
    tx: watch::Sender<Option<SecretString>>,
}

impl AuthTokenProvider {
    /// Provider over an explicit token file path. No read happens until
    /// [`reload`](Self::reload).
    pub fn new(path: PathBuf) -> Self {
        let (tx, _) = watch::channel(None);
        Self { path, tx }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Re-read the token file and re-emit.
    ///
    /// On any failure (missing file, empty file, IO error) the emitted
    /// credential becomes `None` and the error describes what to fix.
    pub fn reload(&self) -> Result<SecretString, ConfigError> {
        match self.read_token() {
            Ok(token) => {
                debug!(path = %self.path.display(), "auth token loaded");
                self.tx.send_replace(Some(token.clone()));
                Ok(token)
            }
            Err(e) => {
                self.tx.send_replace(None);
                Err(e)
            }
        }
    }

    fn read_token(&self) -> Result<SecretString, ConfigError> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::TokenMissing {
                    path: self.path.clone(),
                }
            } else {
                ConfigError::Io(e)
            }
        })?;

        let trimmed = contents.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::TokenEmpty {
                path: self.path.clone(),
            });
        }
        Ok(SecretString::from(trimmed.to_owned()))
    }

    /// The current credential, if the last reload succeeded.
    pub fn token(&self) -> Option<SecretString> {
        self.tx.borrow().clone()
    }

    /// Observe credential changes across reloads.
    pub fn watch(&self) -> watch::Receiver<Option<SecretString>> {
        self.tx.subscribe()
    }
}
