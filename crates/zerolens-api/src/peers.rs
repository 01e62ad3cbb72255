//! Peer endpoints (`/peer` and `/peer/{address}`).

use reqwest::Method;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::client::{EmptyBody, ServiceClient};
use crate::error::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PeerRole {
    Leaf,
    Upstream,
    Root,
    Planet,
    Moon,
}

/// A physical transport path to a peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathInfo {
    /// Transport endpoint, e.g. `203.0.113.7/9993`.
    pub address: String,
    /// Epoch milliseconds; 0 = never.
    pub last_send: i64,
    pub last_receive: i64,
    pub active: bool,
    pub expired: bool,
    pub preferred: bool,
    pub trusted_path_id: i64,
}

/// Per-peer record -- from `GET /peer/{address}` and the elements of
/// `GET /peer`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeerInfo {
    /// 10-character hex node address.
    pub address: String,
    pub version_major: i32,
    pub version_minor: i32,
    pub version_rev: i32,
    pub version: String,
    /// Estimated latency in milliseconds; negative = unknown.
    pub latency: i32,
    pub role: PeerRole,
    pub paths: Vec<PathInfo>,
}

impl PeerInfo {
    /// Latency with the negative "unknown" sentinel mapped to `None`.
    pub fn known_latency(&self) -> Option<u32> {
        u32::try_from(self.latency).ok()
    }
}

impl ServiceClient {
    /// List known peers. Empty bodies are accepted (an isolated node can
    /// legitimately know zero peers).
    pub async fn list_peers(&self, token: Option<&SecretString>) -> Result<Vec<PeerInfo>, Error> {
        self.request(&["peer"], Method::GET, token, EmptyBody::Accept)
            .await
    }

    /// Fetch a single peer by node address. Empty bodies are rejected.
    pub async fn peer(
        &self,
        token: Option<&SecretString>,
        address: &str,
    ) -> Result<PeerInfo, Error> {
        self.request(&["peer", address], Method::GET, token, EmptyBody::Reject)
            .await
    }
}
