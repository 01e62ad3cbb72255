//! Credential-independent service reachability probe.
//!
//! Hits `GET /status` without an auth token and classifies the shape of
//! the rejection. The real service answers anonymous requests with a 401
//! carrying an empty JSON object body; anything else on the port is some
//! unrelated service.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::ServiceClient;

/// Outcome of the anonymous reachability probe. Always a value, never an
/// error: "unreachable" is an answer, not a failure of the probe itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApiHealth {
    /// The transport could not reach the port at all. The service is
    /// likely not installed or not started.
    Unreachable,
    /// Something answered, but not the way the service does. A different
    /// program may be squatting on the port.
    IncorrectService { status: u16 },
    /// HTTP 401 with an empty JSON object body: the service is running
    /// and correctly rejecting anonymous access.
    Confirmed,
}

impl ApiHealth {
    pub fn is_confirmed(self) -> bool {
        matches!(self, Self::Confirmed)
    }
}

impl ServiceClient {
    /// Probe the service without a credential.
    pub async fn probe(&self) -> ApiHealth {
        let Ok(url) = self.route_url(&["status"]) else {
            return ApiHealth::Unreachable;
        };
        debug!("probe {url}");

        let response = match self.http().get(url).send().await {
            Ok(response) => response,
            Err(_) => return ApiHealth::Unreachable,
        };

        let status = response.status().as_u16();
        if status != 401 {
            return ApiHealth::IncorrectService { status };
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) if body.as_object().is_some_and(serde_json::Map::is_empty) => {
                ApiHealth::Confirmed
            }
            _ => ApiHealth::IncorrectService { status },
        }
    }
}
