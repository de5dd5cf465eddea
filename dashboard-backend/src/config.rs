use std::env;
use std::time::Duration;

use ethers::types::Address;

use crate::chains::ChainInfo;

/// Environment variable names
pub mod env_vars {
    pub const PORT: &str = "PORT";
    pub const CHAIN_ID: &str = "CHAIN_ID";
    pub const RPC_URL: &str = "RPC_URL";
    pub const WALLET_PRIVATE_KEY: &str = "WALLET_PRIVATE_KEY";
    pub const VOTING_CONTRACT_ADDRESS: &str = "VOTING_CONTRACT_ADDRESS";
    pub const CONFIRMATION_TIMEOUT_SECS: &str = "CONFIRMATION_TIMEOUT_SECS";
    pub const RECEIPT_POLL_INTERVAL_MS: &str = "RECEIPT_POLL_INTERVAL_MS";
    pub const FRONTEND_DIST: &str = "FRONTEND_DIST";
}

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_CHAIN_ID: u64 = 11_155_111;
const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 120;
const DEFAULT_RECEIPT_POLL_INTERVAL_MS: u64 = 2000;
const DEFAULT_FRONTEND_DIST: &str = "./frontend/dist";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub chain_id: u64,
    pub rpc_url: String,
    pub voting_contract: Option<Address>,
    pub confirmation_timeout: Duration,
    pub receipt_poll_interval: Duration,
    pub frontend_dist: String,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the config from an arbitrary key lookup. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let port = parse_or(get(env_vars::PORT), env_vars::PORT, DEFAULT_PORT)?;
        let chain_id = parse_or(get(env_vars::CHAIN_ID), env_vars::CHAIN_ID, DEFAULT_CHAIN_ID)?;

        let rpc_url = match get(env_vars::RPC_URL) {
            Some(url) => url,
            None => ChainInfo::by_id(chain_id)
                .map(|c| c.default_rpc_url.to_string())
                .ok_or_else(|| {
                    format!(
                        "{} must be set: no default RPC endpoint for chain {}",
                        env_vars::RPC_URL,
                        chain_id
                    )
                })?,
        };
        url::Url::parse(&rpc_url)
            .map_err(|e| format!("{} is not a valid URL ({}): {}", env_vars::RPC_URL, rpc_url, e))?;

        let voting_contract = match get(env_vars::VOTING_CONTRACT_ADDRESS) {
            Some(addr) => Some(addr.parse::<Address>().map_err(|_| {
                format!("{} is not a valid address: {}", env_vars::VOTING_CONTRACT_ADDRESS, addr)
            })?),
            None => None,
        };

        let timeout_secs = parse_or(
            get(env_vars::CONFIRMATION_TIMEOUT_SECS),
            env_vars::CONFIRMATION_TIMEOUT_SECS,
            DEFAULT_CONFIRMATION_TIMEOUT_SECS,
        )?;
        let poll_ms = parse_or(
            get(env_vars::RECEIPT_POLL_INTERVAL_MS),
            env_vars::RECEIPT_POLL_INTERVAL_MS,
            DEFAULT_RECEIPT_POLL_INTERVAL_MS,
        )?;
        if poll_ms == 0 {
            return Err(format!("{} must be greater than 0", env_vars::RECEIPT_POLL_INTERVAL_MS));
        }

        Ok(Self {
            port,
            chain_id,
            rpc_url,
            voting_contract,
            confirmation_timeout: Duration::from_secs(timeout_secs),
            receipt_poll_interval: Duration::from_millis(poll_ms),
            frontend_dist: get(env_vars::FRONTEND_DIST)
                .unwrap_or_else(|| DEFAULT_FRONTEND_DIST.to_string()),
        })
    }
}

/// Private key for the connected wallet, if one is configured
pub fn wallet_private_key() -> Option<String> {
    env::var(env_vars::WALLET_PRIVATE_KEY)
        .ok()
        .filter(|k| !k.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(value: Option<String>, key: &str, default: T) -> Result<T, String> {
    match value {
        Some(v) => v
            .parse()
            .map_err(|_| format!("{} must be a valid number, got '{}'", key, v)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.chain_id, 11_155_111);
        assert!(config.rpc_url.starts_with("https://"));
        assert!(config.voting_contract.is_none());
        assert_eq!(config.confirmation_timeout, Duration::from_secs(120));
        assert_eq!(config.receipt_poll_interval, Duration::from_millis(2000));
        assert_eq!(config.frontend_dist, "./frontend/dist");
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("CHAIN_ID", "1"),
            ("RPC_URL", "http://localhost:8545"),
            ("VOTING_CONTRACT_ADDRESS", "0x5FbDB2315678afecb367f032d93F642f64180aa3"),
            ("CONFIRMATION_TIMEOUT_SECS", "30"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.chain_id, 1);
        assert_eq!(config.rpc_url, "http://localhost:8545");
        assert!(config.voting_contract.is_some());
        assert_eq!(config.confirmation_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config = Config::from_lookup(lookup(&[("VOTING_CONTRACT_ADDRESS", "  ")])).unwrap();
        assert!(config.voting_contract.is_none());
    }

    #[test]
    fn test_invalid_port() {
        let err = Config::from_lookup(lookup(&[("PORT", "eighty")])).unwrap_err();
        assert!(err.contains("PORT"));
    }

    #[test]
    fn test_invalid_contract_address() {
        let err = Config::from_lookup(lookup(&[("VOTING_CONTRACT_ADDRESS", "0xnope")])).unwrap_err();
        assert!(err.contains("VOTING_CONTRACT_ADDRESS"));
    }

    #[test]
    fn test_unknown_chain_requires_rpc_url() {
        let err = Config::from_lookup(lookup(&[("CHAIN_ID", "424242")])).unwrap_err();
        assert!(err.contains("RPC_URL"));
    }

    #[test]
    fn test_invalid_rpc_url() {
        assert!(Config::from_lookup(lookup(&[("RPC_URL", "not a url")])).is_err());
    }
}
