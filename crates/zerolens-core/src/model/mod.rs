//! Domain identity types.

mod network_id;

pub use network_id::{InvalidNetworkId, NetworkId};
