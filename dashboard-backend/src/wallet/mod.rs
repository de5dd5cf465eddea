//! Wallet Provider Abstraction
//!
//! The connected wallet is the account the dashboard acts for. It is loaded
//! once at startup; when no key is configured the dashboard runs read-only
//! and every dispatch reports "wallet not connected".

mod env_provider;

pub use env_provider::EnvWalletProvider;

use async_trait::async_trait;
use ethers::signers::LocalWallet;
use std::sync::Arc;

use crate::config;

/// Trait for wallet providers - abstracts where the signing wallet comes from
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// Get the wallet for signing transactions
    async fn get_wallet(&self) -> Result<LocalWallet, String>;

    /// Get the wallet address (lowercase hex, 0x-prefixed)
    fn get_address(&self) -> String;

    /// Get the mode name for logging
    fn mode_name(&self) -> &'static str;
}

/// Create the wallet provider from the environment.
///
/// Returns `Ok(None)` when `WALLET_PRIVATE_KEY` is unset.
pub fn create_wallet_provider() -> Result<Option<Arc<dyn WalletProvider>>, String> {
    let Some(private_key) = config::wallet_private_key() else {
        log::warn!(
            "{} not set - dashboard will run without a connected wallet",
            config::env_vars::WALLET_PRIVATE_KEY
        );
        return Ok(None);
    };

    let provider = EnvWalletProvider::from_private_key(&private_key)?;
    log::info!(
        "Wallet provider initialized ({} mode): {}",
        provider.mode_name(),
        provider.get_address()
    );
    Ok(Some(Arc::new(provider)))
}
