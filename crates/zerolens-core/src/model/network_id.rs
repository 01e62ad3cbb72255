// ── Network identity ──
//
// A ZeroTier network ID is exactly 16 hex characters: a 10-character
// host-address prefix (the controller node) followed by a 6-character
// network-number suffix. The split is purely positional; the service is
// the only authority on whether the network actually exists.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation failure for a would-be [`NetworkId`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("'{value}' is not a 16-character hexadecimal ZeroTier network ID")]
pub struct InvalidNetworkId {
    pub value: String,
}

/// Validated 16-character hex network identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct NetworkId(String);

impl NetworkId {
    /// Total identifier length in hex characters.
    pub const LEN: usize = 16;
    /// Length of the host-address prefix.
    pub const HOST_LEN: usize = 10;

    /// Returns `true` iff `value` matches `^[0-9a-fA-F]{16}$`.
    pub fn is_valid(value: &str) -> bool {
        value.len() == Self::LEN && value.bytes().all(|b| b.is_ascii_hexdigit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The 10-character host-address prefix (the controller's node address).
    pub fn host_address(&self) -> &str {
        &self.0[..Self::HOST_LEN]
    }

    /// The 6-character network-number suffix.
    pub fn network_number(&self) -> &str {
        &self.0[Self::HOST_LEN..]
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for NetworkId {
    type Err = InvalidNetworkId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::is_valid(s) {
            Ok(Self(s.to_owned()))
        } else {
            Err(InvalidNetworkId {
                value: s.to_owned(),
            })
        }
    }
}

impl TryFrom<String> for NetworkId {
    type Error = InvalidNetworkId;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if Self::is_valid(&s) {
            Ok(Self(s))
        } else {
            Err(InvalidNetworkId { value: s })
        }
    }
}

impl From<NetworkId> for String {
    fn from(id: NetworkId) -> Self {
        id.0
    }
}
