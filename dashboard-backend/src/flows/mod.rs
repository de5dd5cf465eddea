//! User flows that submit transactions
//!
//! Both flows follow the same pattern: validate the input, submit through
//! the [`ChainClient`](crate::chain::ChainClient), hand the returned hash to
//! a [`TxTracker`] and spawn a watcher that drives the tracker to success or
//! error. The confirmation side effect (clearing the transfer form,
//! re-reading the vote tally) runs only on the tracker's success edge.
//!
//! Watchers hold a `Weak` reference to their flow and a cancellation token
//! owned by the session, so a confirmation that arrives after the session is
//! gone is dropped on the floor.

pub mod error;
pub mod projector;
pub mod tracker;
pub mod transfer;
pub mod voting;

pub use error::FlowError;
pub use tracker::{DispatchTicket, TxTracker};
pub use transfer::TransferFlow;
pub use voting::VotingFlow;

use dashboard_types::TxStateView;
use ethers::types::TxHash;
use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::chain::ChainError;

/// Longest the node may take to accept a submitted transaction
pub const SUBMIT_TIMEOUT: Duration = Duration::from_secs(60);

/// Await a submission, reporting one that outlives `limit` as rejected
pub(crate) async fn submit_within<F>(limit: Duration, send: F) -> Result<TxHash, FlowError>
where
    F: Future<Output = Result<TxHash, ChainError>>,
{
    match tokio::time::timeout(limit, send).await {
        Ok(result) => Ok(result?),
        Err(_) => Err(FlowError::Rejected(format!(
            "Transaction not accepted by the node within {:?}",
            limit
        ))),
    }
}

/// Run a dispatch on its own task. The tracker is settled even if the
/// request that started the dispatch is dropped mid-submission.
pub(crate) async fn detach<F>(
    dispatch: F,
    tracker: &TxTracker,
    ticket: DispatchTicket,
) -> Result<PendingTx, FlowError>
where
    F: Future<Output = Result<PendingTx, FlowError>> + Send + 'static,
{
    match tokio::spawn(dispatch).await {
        Ok(result) => result,
        Err(e) => {
            let err = FlowError::Rejected(e.to_string());
            tracker.failed(ticket, &err.detail());
            Err(err)
        }
    }
}

/// A submitted transaction whose confirmation is being watched
#[derive(Debug)]
pub struct PendingTx {
    pub tx_hash: TxHash,
    /// Tracker state right after submission
    pub state: TxStateView,
    watcher: JoinHandle<()>,
}

impl PendingTx {
    pub(crate) fn new(tx_hash: TxHash, state: TxStateView, watcher: JoinHandle<()>) -> Self {
        Self {
            tx_hash,
            state,
            watcher,
        }
    }

    /// Wait for the watcher to finish
    pub async fn settled(self) {
        if let Err(e) = self.watcher.await {
            log::error!("Confirmation watcher for {:?} panicked: {}", self.tx_hash, e);
        }
    }
}
