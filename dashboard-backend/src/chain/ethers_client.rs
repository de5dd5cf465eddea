//! ChainClient backed by an ethers HTTP provider
//!
//! Reads go straight to the provider. Writes go through a SignerMiddleware
//! wrapping the connected wallet, which fills nonce, gas and fees.

use async_trait::async_trait;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Address, Bytes, TransactionRequest, TxHash, U256, U64};
use std::time::{Duration, Instant};

use super::{ChainClient, ChainError, ReceiptSummary};
use crate::config::Config;

pub struct EthersChainClient {
    provider: Provider<Http>,
    signer: Option<SignerMiddleware<Provider<Http>, LocalWallet>>,
    chain_id: u64,
    receipt_poll_interval: Duration,
    confirmation_timeout: Duration,
}

impl EthersChainClient {
    pub fn new(
        rpc_url: &str,
        chain_id: u64,
        wallet: Option<LocalWallet>,
        receipt_poll_interval: Duration,
        confirmation_timeout: Duration,
    ) -> Result<Self, String> {
        let provider = Provider::<Http>::try_from(rpc_url)
            .map_err(|e| format!("Invalid RPC URL {}: {}", rpc_url, e))?
            .interval(receipt_poll_interval);

        let signer = wallet
            .map(|w| SignerMiddleware::new(provider.clone(), w.with_chain_id(chain_id)));

        Ok(Self {
            provider,
            signer,
            chain_id,
            receipt_poll_interval,
            confirmation_timeout,
        })
    }

    /// Build a client from config, asking the node for its chain id.
    /// Falls back to the configured CHAIN_ID when the node is unreachable.
    pub async fn connect(config: &Config, wallet: Option<LocalWallet>) -> Result<Self, String> {
        let rpc = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| format!("Invalid RPC URL {}: {}", config.rpc_url, e))?;

        let chain_id = match rpc.get_chainid().await {
            Ok(id) => {
                let id = id.as_u64();
                if id != config.chain_id {
                    log::warn!(
                        "[CHAIN] RPC reports chain {} but CHAIN_ID is {}; using {}",
                        id,
                        config.chain_id,
                        id
                    );
                }
                id
            }
            Err(e) => {
                log::warn!(
                    "[CHAIN] Could not fetch chain id from {}: {} - assuming {}",
                    config.rpc_url,
                    e,
                    config.chain_id
                );
                config.chain_id
            }
        };

        log::info!("[CHAIN] Connected to chain {} via {}", chain_id, config.rpc_url);

        Self::new(
            &config.rpc_url,
            chain_id,
            wallet,
            config.receipt_poll_interval,
            config.confirmation_timeout,
        )
    }
}

#[async_trait]
impl ChainClient for EthersChainClient {
    fn account(&self) -> Option<Address> {
        self.signer.as_ref().map(|s| s.address())
    }

    async fn chain_id(&self) -> Result<u64, ChainError> {
        Ok(self.chain_id)
    }

    async fn balance(&self, address: Address) -> Result<U256, ChainError> {
        self.provider
            .get_balance(address, None)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn block_number(&self) -> Result<u64, ChainError> {
        self.provider
            .get_block_number()
            .await
            .map(|n| n.as_u64())
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError> {
        let mut tx: TypedTransaction = TransactionRequest::new().to(to).data(data).into();
        if let Some(from) = self.account() {
            tx.set_from(from);
        }
        self.provider
            .call(&tx, None)
            .await
            .map_err(|e| ChainError::Rpc(e.to_string()))
    }

    async fn send_transaction(
        &self,
        to: Address,
        value: U256,
        data: Option<Bytes>,
    ) -> Result<TxHash, ChainError> {
        let signer = self.signer.as_ref().ok_or(ChainError::NotConnected)?;

        let mut tx = TransactionRequest::new()
            .from(signer.address())
            .to(to)
            .value(value);
        if let Some(data) = data {
            tx = tx.data(data);
        }

        log::info!(
            "[CHAIN] Sending tx to {:?} value={} on chain {}",
            to,
            value,
            self.chain_id
        );

        let pending = signer
            .send_transaction(tx, None)
            .await
            .map_err(|e| ChainError::Rejected(e.to_string()))?;

        let tx_hash = pending.tx_hash();
        log::info!("[CHAIN] Transaction accepted: {:?}", tx_hash);
        Ok(tx_hash)
    }

    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<ReceiptSummary, ChainError> {
        let started = Instant::now();

        loop {
            match self.provider.get_transaction_receipt(tx_hash).await {
                Ok(Some(receipt)) => {
                    if receipt.status == Some(U64::from(1)) {
                        return Ok(ReceiptSummary {
                            tx_hash,
                            block_number: receipt.block_number.map(|b| b.as_u64()),
                            gas_used: receipt.gas_used,
                        });
                    }
                    return Err(ChainError::Reverted(tx_hash));
                }
                Ok(None) => {}
                Err(e) => {
                    log::warn!("[CHAIN] Receipt poll for {:?} failed: {}", tx_hash, e);
                }
            }

            if started.elapsed() >= self.confirmation_timeout {
                return Err(ChainError::Timeout(tx_hash, self.confirmation_timeout.as_secs()));
            }
            tokio::time::sleep(self.receipt_poll_interval).await;
        }
    }
}
