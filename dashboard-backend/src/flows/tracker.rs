use chrono::{DateTime, Utc};
use dashboard_types::{FlowKind, TxStateView, TxStatus};
use ethers::types::TxHash;
use parking_lot::RwLock;
use std::sync::Arc;

use super::error::{error_detail, FlowError};
use crate::chains::ChainInfo;
use crate::gateway::events::EventBroadcaster;
use crate::gateway::protocol::GatewayEvent;

/// Proof that the holder started the current dispatch.
///
/// Transitions made with a ticket from a superseded dispatch are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchTicket {
    generation: u64,
}

struct TrackerState {
    status: TxStatus,
    tx_hash: Option<TxHash>,
    error: Option<String>,
    /// Set from begin() until a terminal transition
    in_flight: bool,
    generation: u64,
    updated_at: DateTime<Utc>,
}

/// Lifecycle of the latest transaction dispatched by one flow.
///
/// ```text
/// idle --submitted--> pending --confirmed--> success
///   |                    |
///   +-------failed-------+-------failed----> error
/// ```
///
/// `begin()` resets to idle and refuses while a dispatch is in flight, so at
/// most one transaction per tracker is outstanding. Every transition is
/// published on the event gateway while the state lock is held, which keeps
/// the published order identical to the transition order.
pub struct TxTracker {
    flow: FlowKind,
    chain_id: u64,
    state: RwLock<TrackerState>,
    broadcaster: Option<Arc<EventBroadcaster>>,
}

impl TxTracker {
    pub fn new(flow: FlowKind, chain_id: u64, broadcaster: Option<Arc<EventBroadcaster>>) -> Self {
        Self {
            flow,
            chain_id,
            state: RwLock::new(TrackerState {
                status: TxStatus::Idle,
                tx_hash: None,
                error: None,
                in_flight: false,
                generation: 0,
                updated_at: Utc::now(),
            }),
            broadcaster,
        }
    }

    pub fn begin(&self) -> Result<DispatchTicket, FlowError> {
        let mut state = self.state.write();
        if state.in_flight {
            log::debug!("[TRACKER] {} dispatch refused: already in flight", self.flow);
            return Err(FlowError::AlreadyPending);
        }

        state.status = TxStatus::Idle;
        state.tx_hash = None;
        state.error = None;
        state.in_flight = true;
        state.generation += 1;
        state.updated_at = Utc::now();

        let ticket = DispatchTicket {
            generation: state.generation,
        };
        self.publish(&state, None);
        Ok(ticket)
    }

    /// idle -> pending
    pub fn submitted(&self, ticket: DispatchTicket, tx_hash: TxHash) -> bool {
        let mut state = self.state.write();
        if !self.is_current(&state, ticket) || state.status != TxStatus::Idle {
            return false;
        }

        state.status = TxStatus::Pending;
        state.tx_hash = Some(tx_hash);
        state.updated_at = Utc::now();

        log::info!("[TRACKER] {} pending: {:?}", self.flow, tx_hash);
        self.publish(&state, None);
        true
    }

    /// pending -> success. Returns true only for the call that made the
    /// transition; the confirmation side effect runs on that edge alone.
    pub fn confirmed(&self, ticket: DispatchTicket, block_number: Option<u64>) -> bool {
        let mut state = self.state.write();
        if !self.is_current(&state, ticket) || state.status != TxStatus::Pending {
            return false;
        }

        state.status = TxStatus::Success;
        state.in_flight = false;
        state.updated_at = Utc::now();

        log::info!(
            "[TRACKER] {} confirmed: {:?} (block {:?})",
            self.flow,
            state.tx_hash,
            block_number
        );
        self.publish(&state, block_number);
        true
    }

    /// idle | pending -> error
    pub fn failed(&self, ticket: DispatchTicket, message: &str) -> bool {
        let mut state = self.state.write();
        if !self.is_current(&state, ticket)
            || !matches!(state.status, TxStatus::Idle | TxStatus::Pending)
        {
            return false;
        }

        let detail = error_detail(message);
        log::warn!("[TRACKER] {} failed: {}", self.flow, detail);

        state.status = TxStatus::Error;
        state.error = Some(detail);
        state.in_flight = false;
        state.updated_at = Utc::now();

        self.publish(&state, None);
        true
    }

    pub fn snapshot(&self) -> TxStateView {
        self.view(&self.state.read())
    }

    pub fn is_in_flight(&self) -> bool {
        self.state.read().in_flight
    }

    fn is_current(&self, state: &TrackerState, ticket: DispatchTicket) -> bool {
        if !state.in_flight || state.generation != ticket.generation {
            log::debug!(
                "[TRACKER] {} ignoring stale ticket {} (current {})",
                self.flow,
                ticket.generation,
                state.generation
            );
            return false;
        }
        true
    }

    fn view(&self, state: &TrackerState) -> TxStateView {
        TxStateView {
            flow: self.flow,
            status: state.status,
            tx_hash: state.tx_hash.map(|h| format!("{:?}", h)),
            error: state.error.clone(),
            is_loading: state.in_flight,
            is_success: state.status == TxStatus::Success,
            is_error: state.status == TxStatus::Error,
            updated_at: state.updated_at.to_rfc3339(),
        }
    }

    fn publish(&self, state: &TrackerState, block_number: Option<u64>) {
        let Some(broadcaster) = &self.broadcaster else {
            return;
        };
        let view = self.view(state);
        broadcaster.broadcast(GatewayEvent::tx_status(&view));

        match view.status {
            TxStatus::Pending => {
                let explorer_url = view
                    .tx_hash
                    .as_deref()
                    .and_then(|h| ChainInfo::by_id(self.chain_id).and_then(|c| c.tx_url(h)));
                broadcaster.broadcast(GatewayEvent::tx_pending(&view, explorer_url.as_deref()));
            }
            TxStatus::Success => {
                broadcaster.broadcast(GatewayEvent::tx_confirmed(&view, block_number));
            }
            TxStatus::Error => broadcaster.broadcast(GatewayEvent::tx_failed(&view)),
            TxStatus::Idle => {}
        }
    }
}
