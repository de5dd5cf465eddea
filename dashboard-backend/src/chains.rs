//! Known chain metadata
//!
//! The dashboard supports Ethereum mainnet and Sepolia. A local dev node
//! (anvil / hardhat) is listed so the service can run against one without
//! extra configuration.

use dashboard_types::ChainView;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainInfo {
    pub id: u64,
    pub name: &'static str,
    pub native_symbol: &'static str,
    pub native_decimals: u32,
    pub default_rpc_url: &'static str,
    pub explorer_url: Option<&'static str>,
}

const KNOWN_CHAINS: &[ChainInfo] = &[
    ChainInfo {
        id: 1,
        name: "Ethereum",
        native_symbol: "ETH",
        native_decimals: 18,
        default_rpc_url: "https://ethereum-rpc.publicnode.com",
        explorer_url: Some("https://etherscan.io"),
    },
    ChainInfo {
        id: 11_155_111,
        name: "Sepolia",
        native_symbol: "ETH",
        native_decimals: 18,
        default_rpc_url: "https://ethereum-sepolia-rpc.publicnode.com",
        explorer_url: Some("https://sepolia.etherscan.io"),
    },
    ChainInfo {
        id: 31_337,
        name: "Localhost",
        native_symbol: "ETH",
        native_decimals: 18,
        default_rpc_url: "http://127.0.0.1:8545",
        explorer_url: None,
    },
];

/// Decimals assumed for the native currency of an unknown chain
pub const DEFAULT_NATIVE_DECIMALS: u32 = 18;

impl ChainInfo {
    pub fn by_id(id: u64) -> Option<&'static ChainInfo> {
        KNOWN_CHAINS.iter().find(|c| c.id == id)
    }

    pub fn tx_url(&self, tx_hash: &str) -> Option<String> {
        self.explorer_url.map(|base| format!("{}/tx/{}", base, tx_hash))
    }

    pub fn to_view(&self) -> ChainView {
        ChainView {
            id: self.id,
            name: self.name.to_string(),
            native_symbol: self.native_symbol.to_string(),
            explorer_url: self.explorer_url.map(|u| u.to_string()),
        }
    }
}

/// View for any chain id, falling back to "Unknown" metadata
pub fn chain_view(id: u64) -> ChainView {
    match ChainInfo::by_id(id) {
        Some(info) => info.to_view(),
        None => ChainView {
            id,
            name: "Unknown".to_string(),
            native_symbol: "ETH".to_string(),
            explorer_url: None,
        },
    }
}

pub fn native_decimals(id: u64) -> u32 {
    ChainInfo::by_id(id)
        .map(|c| c.native_decimals)
        .unwrap_or(DEFAULT_NATIVE_DECIMALS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_chains() {
        assert_eq!(ChainInfo::by_id(1).unwrap().name, "Ethereum");
        assert_eq!(ChainInfo::by_id(11_155_111).unwrap().name, "Sepolia");
        assert!(ChainInfo::by_id(8453).is_none());
    }

    #[test]
    fn test_unknown_chain_view() {
        let view = chain_view(999);
        assert_eq!(view.name, "Unknown");
        assert_eq!(view.id, 999);
        assert_eq!(native_decimals(999), 18);
    }

    #[test]
    fn test_tx_url() {
        let sepolia = ChainInfo::by_id(11_155_111).unwrap();
        assert_eq!(
            sepolia.tx_url("0xabc").as_deref(),
            Some("https://sepolia.etherscan.io/tx/0xabc")
        );
        assert!(ChainInfo::by_id(31_337).unwrap().tx_url("0xabc").is_none());
    }
}
