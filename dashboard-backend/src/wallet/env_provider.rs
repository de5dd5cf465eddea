//! Environment-based Wallet Provider
//!
//! Loads the connected wallet from WALLET_PRIVATE_KEY.

use async_trait::async_trait;
use ethers::core::k256::ecdsa::SigningKey;
use ethers::signers::{LocalWallet, Signer};

use super::WalletProvider;

pub struct EnvWalletProvider {
    wallet: LocalWallet,
    address: String,
}

impl EnvWalletProvider {
    /// Create provider from a private key string, with or without 0x prefix
    pub fn from_private_key(private_key: &str) -> Result<Self, String> {
        let trimmed = private_key.trim();
        let key_hex = trimmed.strip_prefix("0x").unwrap_or(trimmed);

        let key_bytes = hex::decode(key_hex)
            .map_err(|e| format!("Invalid private key hex: {}", e))?;
        if key_bytes.len() != 32 {
            return Err(format!("Invalid private key: expected 32 bytes, got {}", key_bytes.len()));
        }

        let signing_key = SigningKey::from_bytes(key_bytes.as_slice().into())
            .map_err(|e| format!("Invalid private key: {}", e))?;

        let wallet = LocalWallet::from(signing_key);
        let address = format!("{:?}", wallet.address()).to_lowercase();

        Ok(Self { wallet, address })
    }
}

#[async_trait]
impl WalletProvider for EnvWalletProvider {
    async fn get_wallet(&self) -> Result<LocalWallet, String> {
        Ok(self.wallet.clone())
    }

    fn get_address(&self) -> String {
        self.address.clone()
    }

    fn mode_name(&self) -> &'static str {
        "env"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Hardhat / anvil account #0 (DO NOT USE IN PRODUCTION)
    const TEST_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";
    const TEST_ADDRESS: &str = "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266";

    #[test]
    fn test_from_private_key() {
        let provider = EnvWalletProvider::from_private_key(TEST_KEY).unwrap();
        assert_eq!(provider.get_address(), TEST_ADDRESS);
    }

    #[test]
    fn test_from_private_key_no_prefix() {
        let provider = EnvWalletProvider::from_private_key(&TEST_KEY[2..]).unwrap();
        assert_eq!(provider.get_address(), TEST_ADDRESS);
    }

    #[test]
    fn test_rejects_short_key() {
        assert!(EnvWalletProvider::from_private_key("0x1234").is_err());
        assert!(EnvWalletProvider::from_private_key("0xzz").is_err());
    }

    #[tokio::test]
    async fn test_get_wallet() {
        let provider = EnvWalletProvider::from_private_key(TEST_KEY).unwrap();
        let wallet = provider.get_wallet().await.unwrap();
        assert_eq!(format!("{:?}", wallet.address()).to_lowercase(), TEST_ADDRESS);
    }
}
