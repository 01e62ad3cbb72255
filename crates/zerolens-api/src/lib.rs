// zerolens-api: Async Rust client for the ZeroTier One local service API.

pub mod client;
pub mod error;
pub mod networks;
pub mod peers;
pub mod probe;
pub mod resolver;
pub mod status;
pub mod transport;

pub use client::{AUTH_HEADER, EmptyBody, SERVICE_HOST, SERVICE_PORT, ServiceClient};
pub use error::Error;
pub use networks::{ManagedRoute, NetworkInfo, NetworkStatus, NetworkType};
pub use peers::{PathInfo, PeerInfo, PeerRole};
pub use probe::ApiHealth;
pub use resolver::{DnsResolver, SystemResolver};
pub use status::NodeStatus;
pub use transport::TransportConfig;
