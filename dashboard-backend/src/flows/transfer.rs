//! Native currency transfer

use dashboard_types::{FlowKind, TransferDraft, TransferView, TxStateView};
use ethers::types::{Address, TxHash};
use parking_lot::RwLock;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::{detach, submit_within, DispatchTicket, FlowError, PendingTx, TxTracker, SUBMIT_TIMEOUT};
use crate::chain::{units, ChainClient};
use crate::chains;
use crate::gateway::EventBroadcaster;

pub struct TransferFlow {
    client: Arc<dyn ChainClient>,
    tracker: TxTracker,
    /// Form values, kept until the transfer confirms
    draft: RwLock<Option<TransferDraft>>,
    decimals: u32,
    submit_timeout: Duration,
    cancel: CancellationToken,
}

impl TransferFlow {
    pub fn new(
        client: Arc<dyn ChainClient>,
        chain_id: u64,
        broadcaster: Option<Arc<EventBroadcaster>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            client,
            tracker: TxTracker::new(FlowKind::Transfer, chain_id, broadcaster),
            draft: RwLock::new(None),
            decimals: chains::native_decimals(chain_id),
            submit_timeout: SUBMIT_TIMEOUT,
            cancel,
        }
    }

    #[cfg(test)]
    pub fn with_submit_timeout(mut self, limit: Duration) -> Self {
        self.submit_timeout = limit;
        self
    }

    pub fn is_connected(&self) -> bool {
        self.client.account().is_some()
    }

    pub fn state(&self) -> TxStateView {
        self.tracker.snapshot()
    }

    pub fn draft(&self) -> Option<TransferDraft> {
        self.draft.read().clone()
    }

    pub fn view(&self) -> TransferView {
        TransferView {
            is_connected: self.is_connected(),
            draft: self.draft(),
            state: self.state(),
        }
    }

    /// Send `amount` (display units) of the native currency to `to`.
    ///
    /// Returns once the node accepts the transaction; confirmation is
    /// tracked in the background.
    pub async fn transfer(self: &Arc<Self>, to: &str, amount: &str) -> Result<PendingTx, FlowError> {
        if !self.is_connected() {
            return Err(FlowError::NotConnected);
        }

        let ticket = self.tracker.begin()?;
        *self.draft.write() = Some(TransferDraft {
            to: to.to_string(),
            amount: amount.to_string(),
        });

        let flow = self.clone();
        let (to, amount) = (to.to_string(), amount.to_string());
        detach(
            async move { flow.dispatch(ticket, &to, &amount).await },
            &self.tracker,
            ticket,
        )
        .await
    }

    async fn dispatch(
        self: Arc<Self>,
        ticket: DispatchTicket,
        to: &str,
        amount: &str,
    ) -> Result<PendingTx, FlowError> {
        match self.submit(to, amount).await {
            Ok(tx_hash) => {
                self.tracker.submitted(ticket, tx_hash);
                let watcher = self.spawn_watcher(ticket, tx_hash);
                Ok(PendingTx::new(tx_hash, self.tracker.snapshot(), watcher))
            }
            Err(e) => {
                self.tracker.failed(ticket, &e.detail());
                Err(e)
            }
        }
    }

    async fn submit(&self, to: &str, amount: &str) -> Result<TxHash, FlowError> {
        let recipient = parse_address(to)?;
        let value = units::parse_amount(amount, self.decimals).map_err(|reason| {
            FlowError::InvalidAmount {
                amount: amount.to_string(),
                reason,
            }
        })?;

        log::info!("[TRANSFER] Sending {} ({} base units) to {:?}", amount.trim(), value, recipient);
        let send = self.client.send_transaction(recipient, value, None);
        submit_within(self.submit_timeout, send).await
    }

    fn spawn_watcher(self: &Arc<Self>, ticket: DispatchTicket, tx_hash: TxHash) -> JoinHandle<()> {
        let flow: Weak<Self> = Arc::downgrade(self);
        let client = self.client.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::debug!("[TRANSFER] Watcher for {:?} cancelled", tx_hash);
                    return;
                }
                outcome = client.wait_for_receipt(tx_hash) => outcome,
            };

            let Some(flow) = flow.upgrade() else {
                log::debug!("[TRANSFER] Flow gone, discarding outcome of {:?}", tx_hash);
                return;
            };

            match outcome {
                Ok(receipt) => {
                    if flow.tracker.confirmed(ticket, receipt.block_number) {
                        flow.draft.write().take();
                        log::info!(
                            "[TRANSFER] {:?} confirmed (gas used {:?}), form cleared",
                            receipt.tx_hash,
                            receipt.gas_used
                        );
                    }
                }
                Err(e) => {
                    flow.tracker.failed(ticket, &e.to_string());
                }
            }
        })
    }
}

/// Parse a `0x`-prefixed 20-byte hex address
pub fn parse_address(input: &str) -> Result<Address, FlowError> {
    let invalid = || FlowError::InvalidAddress(input.to_string());

    let hex_part = input.trim().strip_prefix("0x").ok_or_else(invalid)?;
    if hex_part.len() != 40 {
        return Err(invalid());
    }
    let bytes = hex::decode(hex_part).map_err(|_| invalid())?;
    Ok(Address::from_slice(&bytes))
}
