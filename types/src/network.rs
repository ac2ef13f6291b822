//! Network identifier.

use serde::{Deserialize, Serialize};

/// Identifies which network the federation node is bridging.
///
/// Each network keeps its release state in isolated storage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production network.
    Mainnet,
    /// The public test network.
    Testnet,
    /// Local regression-test network.
    Regtest,
}

impl NetworkId {
    /// Human-readable name, also used as the storage key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
            Self::Regtest => "regtest",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_distinct() {
        assert_ne!(NetworkId::Mainnet.as_str(), NetworkId::Testnet.as_str());
        assert_ne!(NetworkId::Testnet.as_str(), NetworkId::Regtest.as_str());
    }
}
