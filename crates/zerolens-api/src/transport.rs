// Shared transport configuration for building reqwest::Client instances.
//
// The service only listens on loopback over plain HTTP, so there is no TLS
// or cookie handling here -- just timeout and identification.

use std::time::Duration;

use crate::error::Error;

/// Transport configuration for the local service HTTP client.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(concat!("zerolens/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::Setup {
                message: e.to_string(),
            })
    }
}
