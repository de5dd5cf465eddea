//! Chain client abstraction
//!
//! Everything the dashboard needs from the blockchain goes through
//! [`ChainClient`]: account and chain queries, contract reads, transaction
//! submission and receipt waiting. The production implementation is
//! [`EthersChainClient`]; tests substitute a scripted mock.

mod ethers_client;
pub mod units;

pub use ethers_client::EthersChainClient;

use async_trait::async_trait;
use ethers::types::{Address, Bytes, TxHash, U256};
use thiserror::Error;

/// Failure reported by the chain layer
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ChainError {
    #[error("wallet not connected")]
    NotConnected,
    /// The node or signer refused the transaction (bad nonce, insufficient funds, ...)
    #[error("{0}")]
    Rejected(String),
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("transaction {0:?} reverted on-chain")]
    Reverted(TxHash),
    #[error("transaction {0:?} not confirmed after {1}s")]
    Timeout(TxHash, u64),
    #[error("failed to decode contract response: {0}")]
    Decode(String),
}

/// The parts of a receipt the dashboard reports
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiptSummary {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
}

#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Address of the connected wallet, if any
    fn account(&self) -> Option<Address>;

    async fn chain_id(&self) -> Result<u64, ChainError>;

    /// Native-currency balance in base units
    async fn balance(&self, address: Address) -> Result<U256, ChainError>;

    async fn block_number(&self) -> Result<u64, ChainError>;

    /// Read-only contract call (eth_call)
    async fn call(&self, to: Address, data: Bytes) -> Result<Bytes, ChainError>;

    /// Sign and submit a transaction from the connected wallet.
    /// Returns the handle as soon as the node accepts it.
    async fn send_transaction(
        &self,
        to: Address,
        value: U256,
        data: Option<Bytes>,
    ) -> Result<TxHash, ChainError>;

    /// Wait until the transaction is mined. A reverted receipt is an error.
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> Result<ReceiptSummary, ChainError>;
}
