//! Node status endpoint (`GET /status`).

use reqwest::Method;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::client::{EmptyBody, ServiceClient};
use crate::error::Error;

/// Node identity and liveness -- from `GET /status`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStatus {
    /// 10-character hex node address.
    pub address: String,
    pub public_identity: String,
    pub planet_world_id: i64,
    pub planet_world_timestamp: i64,
    pub online: bool,
    pub tcp_fallback_active: bool,
    pub relay_policy: String,
    pub version_major: i32,
    pub version_minor: i32,
    pub version_rev: i32,
    pub version: String,
    /// Service-local clock, epoch milliseconds.
    pub clock: i64,
}

impl ServiceClient {
    /// Fetch node status. An empty object body is rejected: `/status`
    /// always has content for a correctly authenticated request.
    pub async fn node_status(&self, token: Option<&SecretString>) -> Result<NodeStatus, Error> {
        self.request(&["status"], Method::GET, token, EmptyBody::Reject)
            .await
    }
}
