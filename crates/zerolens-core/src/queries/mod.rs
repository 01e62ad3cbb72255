// ── Resource query definitions ──
//
// One module per resource kind. Each definition is a pure declaration
// over the fetcher and the cache: its key, its loader, and its
// polling/staleness options. Retry is deliberately absent everywhere;
// polling already provides eventual consistency.

pub mod dns;
pub mod health;
pub mod networks;
pub mod node;
pub mod peers;

use crate::cache::QueryKey;

/// Namespace for everything backed by the local service.
pub const NS_SERVICE: &str = "zerotier";
/// Namespace for DNS lookups (not invalidated by service mutations).
pub const NS_DNS: &str = "dns";

/// Key constructors. Two queries for the same logical resource must
/// produce identical keys, so every definition goes through these.
pub mod keys {
    use super::{NS_DNS, NS_SERVICE, QueryKey};

    pub fn service() -> QueryKey {
        QueryKey::new([NS_SERVICE])
    }

    pub fn api() -> QueryKey {
        QueryKey::new([NS_SERVICE, "api"])
    }

    pub fn node() -> QueryKey {
        QueryKey::new([NS_SERVICE, "node"])
    }

    pub fn networks() -> QueryKey {
        QueryKey::new([NS_SERVICE, "network"])
    }

    pub fn network(id: &str) -> QueryKey {
        networks().child(id)
    }

    pub fn peers() -> QueryKey {
        QueryKey::new([NS_SERVICE, "peer"])
    }

    pub fn peer(address: &str) -> QueryKey {
        peers().child(address)
    }

    pub fn dns_txt(domain: &str) -> QueryKey {
        QueryKey::new([NS_DNS, "lookup", "txt", domain])
    }

    pub fn dns_reverse(ip: &str) -> QueryKey {
        QueryKey::new([NS_DNS, "lookup", "reverse", ip])
    }
}
