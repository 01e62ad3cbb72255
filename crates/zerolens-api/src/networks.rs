//! Network endpoints (`/network` and `/network/{id}`).

use reqwest::Method;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::client::{EmptyBody, ServiceClient};
use crate::error::Error;

/// Membership status of a joined (or attempted) network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkStatus {
    RequestingConfiguration,
    Ok,
    AccessDenied,
    NotFound,
    PortError,
    ClientTooOld,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NetworkType {
    Public,
    Private,
}

/// A route managed by the network controller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagedRoute {
    pub target: String,
    /// `None` means the route is local (no gateway).
    pub via: Option<String>,
}

/// Full per-network record -- from `GET /network/{id}` and the elements
/// of `GET /network`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkInfo {
    /// 16-character hex network identifier.
    pub id: String,
    pub mac: String,
    /// Name declared by the network controller; empty until configuration
    /// has been received.
    pub name: String,
    pub status: NetworkStatus,
    #[serde(rename = "type")]
    pub network_type: NetworkType,
    pub mtu: u32,
    pub dhcp: bool,
    pub bridge: bool,
    pub broadcast_enabled: bool,
    pub port_error: i32,
    pub netconf_revision: i64,
    pub assigned_addresses: Vec<String>,
    pub routes: Vec<ManagedRoute>,
    pub port_device_name: String,
    pub allow_managed: bool,
    pub allow_global: bool,
    pub allow_default: bool,
    #[serde(rename = "allowDNS")]
    pub allow_dns: bool,
}

impl ServiceClient {
    /// List joined/attempted networks. An empty array is a valid answer
    /// (zero joined networks), so empty bodies are accepted.
    pub async fn list_networks(
        &self,
        token: Option<&SecretString>,
    ) -> Result<Vec<NetworkInfo>, Error> {
        self.request(&["network"], Method::GET, token, EmptyBody::Accept)
            .await
    }

    /// Fetch a single network. Empty bodies are rejected: this route is
    /// used for membership-attempt polling, where a blank record means
    /// the credential is subtly wrong.
    pub async fn network(
        &self,
        token: Option<&SecretString>,
        id: &str,
    ) -> Result<NetworkInfo, Error> {
        self.request(&["network", id], Method::GET, token, EmptyBody::Reject)
            .await
    }

    /// Join a network (`POST /network/{id}`). Returns the service's view
    /// of the network, typically in `RequestingConfiguration` state.
    pub async fn join_network(
        &self,
        token: Option<&SecretString>,
        id: &str,
    ) -> Result<NetworkInfo, Error> {
        self.request(&["network", id], Method::POST, token, EmptyBody::Reject)
            .await
    }

    /// Leave a network (`DELETE /network/{id}`). The response body is
    /// not interesting beyond its status code; 404 means the network was
    /// already left.
    pub async fn leave_network(&self, token: Option<&SecretString>, id: &str) -> Result<(), Error> {
        self.request::<serde_json::Value>(&["network", id], Method::DELETE, token, EmptyBody::Accept)
            .await
            .map(|_| ())
    }
}
