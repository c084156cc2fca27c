use std::fmt::Display;

use serde::{Deserialize, Serialize};

/// Provider networks the engine can watch. Serialized identifiers match the
/// provider's own network names (`ETH_MAINNET` etc.) so config files and API
/// payloads can use them verbatim.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Network {
    #[default]
    EthMainnet,
    EthSepolia,
    MaticMainnet,
    MaticAmoy,
    ArbMainnet,
    OptMainnet,
    BaseMainnet,
}

impl Network {
    /// Subdomain used when building provider endpoint URLs.
    pub fn slug(&self) -> &'static str {
        match self {
            Network::EthMainnet => "eth-mainnet",
            Network::EthSepolia => "eth-sepolia",
            Network::MaticMainnet => "polygon-mainnet",
            Network::MaticAmoy => "polygon-amoy",
            Network::ArbMainnet => "arb-mainnet",
            Network::OptMainnet => "opt-mainnet",
            Network::BaseMainnet => "base-mainnet",
        }
    }
}

impl Display for Network {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Network::EthMainnet => write!(f, "ETH_MAINNET"),
            Network::EthSepolia => write!(f, "ETH_SEPOLIA"),
            Network::MaticMainnet => write!(f, "MATIC_MAINNET"),
            Network::MaticAmoy => write!(f, "MATIC_AMOY"),
            Network::ArbMainnet => write!(f, "ARB_MAINNET"),
            Network::OptMainnet => write!(f, "OPT_MAINNET"),
            Network::BaseMainnet => write!(f, "BASE_MAINNET"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_network_serde_matches_provider_names() {
        let json = serde_json::to_string(&Network::EthMainnet).unwrap();
        assert_eq!(json, "\"ETH_MAINNET\"");

        let network: Network = serde_json::from_str("\"MATIC_MAINNET\"").unwrap();
        assert_eq!(network, Network::MaticMainnet);
    }

    #[test]
    fn test_default_network_is_eth_mainnet() {
        assert_eq!(Network::default(), Network::EthMainnet);
    }

    #[test]
    fn test_slug_mapping() {
        assert_eq!(Network::MaticMainnet.slug(), "polygon-mainnet");
        assert_eq!(Network::BaseMainnet.slug(), "base-mainnet");
    }
}
