//! Node identity addresses

use serde::{Deserialize, Serialize};
use std::fmt;

/// Network identity of a node, a hex-encoded account address.
///
/// Identities are opaque to the connection core: they are compared, hashed
/// and forwarded, never interpreted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity {
    address: String,
}

impl Identity {
    /// Wrap an existing address string.
    pub fn from_address(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
        }
    }

    /// The raw address string.
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address)
    }
}
