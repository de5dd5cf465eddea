//! Voting contract flow
//!
//! Holds the last reads of the contract (options, counts, voter record) and
//! dispatches `vote(option)`. Counts are never updated optimistically: they
//! change only when a confirmed vote triggers a re-read.

use dashboard_types::{FlowKind, TxStateView, VoteOption, VotingSummary, VotingView};
use ethers::types::{TxHash, U256};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::projector::{self, VoteProjection};
use super::{detach, submit_within, DispatchTicket, FlowError, PendingTx, TxTracker, SUBMIT_TIMEOUT};
use crate::chain::{ChainClient, ChainError};
use crate::contracts::voting::VotingContract;
use crate::gateway::protocol::GatewayEvent;
use crate::gateway::EventBroadcaster;

/// Last successful contract reads. Each read replaces its `Arc`, which is
/// what the projection keys on.
#[derive(Default)]
struct ContractReads {
    options: Option<Arc<Vec<String>>>,
    counts: Option<Arc<Vec<U256>>>,
    has_voted: Option<bool>,
}

pub struct VotingFlow {
    contract: VotingContract,
    client: Arc<dyn ChainClient>,
    tracker: TxTracker,
    reads: RwLock<ContractReads>,
    loading_options: AtomicBool,
    /// Held across a read-and-store so an older read never overwrites a newer one
    refresh_lock: Mutex<()>,
    projection: VoteProjection,
    broadcaster: Option<Arc<EventBroadcaster>>,
    submit_timeout: Duration,
    cancel: CancellationToken,
}

impl VotingFlow {
    pub fn new(
        contract: VotingContract,
        client: Arc<dyn ChainClient>,
        chain_id: u64,
        broadcaster: Option<Arc<EventBroadcaster>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            contract,
            client,
            tracker: TxTracker::new(FlowKind::Vote, chain_id, broadcaster.clone()),
            reads: RwLock::new(ContractReads::default()),
            loading_options: AtomicBool::new(false),
            refresh_lock: Mutex::new(()),
            projection: VoteProjection::new(),
            broadcaster,
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

    pub fn options(&self) -> Option<Arc<Vec<String>>> {
        self.reads.read().options.clone()
    }

    pub fn has_voted(&self) -> Option<bool> {
        self.reads.read().has_voted
    }

    /// Options paired with their counts, once both have been read
    pub fn votes(&self) -> Option<Arc<Vec<VoteOption>>> {
        let (options, counts) = {
            let reads = self.reads.read();
            (reads.options.clone()?, reads.counts.clone()?)
        };
        Some(self.projection.get(&options, &counts))
    }

    pub fn can_vote(&self) -> bool {
        self.is_connected()
            && self.has_voted() != Some(true)
            && !self.tracker.is_in_flight()
            && self.options().is_some_and(|o| !o.is_empty())
    }

    pub fn view(&self) -> VotingView {
        let votes = self.votes();
        VotingView {
            contract_address: format!("{:?}", self.contract.address()),
            is_connected: self.is_connected(),
            options: self.options().map(|o| o.as_ref().clone()),
            loading_options: self.loading_options.load(Ordering::SeqCst),
            total_votes: votes.as_deref().map(|v| projector::total_votes(v)).unwrap_or(0),
            votes: votes.as_deref().map(|v| projector::tally(v)),
            has_voted: self.has_voted(),
            can_vote: self.can_vote(),
            state: self.state(),
        }
    }

    pub fn summary(&self) -> VotingSummary {
        VotingSummary {
            enabled: true,
            loading_options: self.loading_options.load(Ordering::SeqCst),
            option_count: self.options().map(|o| o.len()).unwrap_or(0),
            total_votes: self.votes().map(|v| projector::total_votes(&v)).unwrap_or(0),
            has_voted: self.has_voted(),
        }
    }

    /// Re-read options, voter record and counts. A failed read keeps the
    /// previous value.
    pub async fn refresh(&self) {
        let _guard = self.refresh_lock.lock().await;

        self.loading_options.store(true, Ordering::SeqCst);
        let options = self.contract.get_options().await;
        self.loading_options.store(false, Ordering::SeqCst);

        match options {
            Ok(options) => {
                log::debug!("[VOTING] Loaded {} options", options.len());
                self.reads.write().options = Some(Arc::new(options));
            }
            Err(e) => log::warn!("[VOTING] Failed to read options: {}", e),
        }

        self.reload_tally().await;
    }

    /// Re-read the counts and the voter record, then publish the tally.
    /// Callers hold `refresh_lock`.
    async fn reload_tally(&self) {
        let (counts, has_voted) = tokio::join!(self.contract.get_all_votes(), self.read_has_voted());

        {
            let mut reads = self.reads.write();
            match counts {
                Ok(counts) => reads.counts = Some(Arc::new(counts)),
                Err(e) => log::warn!("[VOTING] Failed to read vote counts: {}", e),
            }
            match has_voted {
                // a recorded vote is never withdrawn on chain
                Ok(Some(false)) if reads.has_voted == Some(true) => {}
                Ok(has_voted) => reads.has_voted = has_voted,
                Err(e) => log::warn!("[VOTING] Failed to read voter record: {}", e),
            }
        }

        if let (Some(broadcaster), Some(votes)) = (&self.broadcaster, self.votes()) {
            broadcaster.broadcast(GatewayEvent::votes_updated(
                &projector::tally(&votes),
                projector::total_votes(&votes),
            ));
        }
    }

    async fn read_has_voted(&self) -> Result<Option<bool>, ChainError> {
        match self.client.account() {
            Some(account) => self.contract.has_voted(account).await.map(Some),
            None => Ok(None),
        }
    }

    /// Cast a vote for `option`.
    pub async fn vote(self: &Arc<Self>, option: &str) -> Result<PendingTx, FlowError> {
        if !self.is_connected() {
            return Err(FlowError::NotConnected);
        }

        // the watcher records the vote under the same lock before it clears
        // the in-flight flag
        let ticket = {
            let reads = self.reads.read();
            if reads.has_voted == Some(true) {
                return Err(FlowError::AlreadyVoted);
            }
            self.tracker.begin()?
        };

        let flow = self.clone();
        let option = option.to_string();
        detach(
            async move { flow.dispatch(ticket, &option).await },
            &self.tracker,
            ticket,
        )
        .await
    }

    async fn dispatch(
        self: Arc<Self>,
        ticket: DispatchTicket,
        option: &str,
    ) -> Result<PendingTx, FlowError> {
        match self.submit(option).await {
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

    async fn submit(&self, option: &str) -> Result<TxHash, FlowError> {
        let known = self
            .options()
            .is_some_and(|options| options.iter().any(|o| o == option));
        if !known {
            return Err(FlowError::UnknownOption(option.to_string()));
        }

        log::info!("[VOTING] Voting for '{}' on {:?}", option, self.contract.address());
        submit_within(self.submit_timeout, self.contract.vote(option)).await
    }

    fn spawn_watcher(self: &Arc<Self>, ticket: DispatchTicket, tx_hash: TxHash) -> JoinHandle<()> {
        let flow: Weak<Self> = Arc::downgrade(self);
        let client = self.client.clone();
        let cancel = self.cancel.clone();

        tokio::spawn(async move {
            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    log::debug!("[VOTING] Watcher for {:?} cancelled", tx_hash);
                    return;
                }
                outcome = client.wait_for_receipt(tx_hash) => outcome,
            };

            let Some(flow) = flow.upgrade() else {
                log::debug!("[VOTING] Flow gone, discarding outcome of {:?}", tx_hash);
                return;
            };

            match outcome {
                Ok(receipt) => {
                    let _guard = flow.refresh_lock.lock().await;
                    let confirmed = {
                        let mut reads = flow.reads.write();
                        let confirmed = flow.tracker.confirmed(ticket, receipt.block_number);
                        if confirmed {
                            reads.has_voted = Some(true);
                        }
                        confirmed
                    };
                    if confirmed {
                        log::info!("[VOTING] Vote {:?} confirmed, refreshing tally", tx_hash);
                        flow.reload_tally().await;
                    }
                }
                Err(e) => {
                    flow.tracker.failed(ticket, &e.to_string());
                }
            }
        })
    }
}
