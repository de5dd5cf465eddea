//! Dashboard session
//!
//! A session owns one transfer flow and, when a contract is configured, one
//! voting flow. Resetting the session drops both: their watchers are
//! cancelled and any confirmation still in flight is discarded. The next
//! session starts from idle with fresh contract reads.

use chrono::{DateTime, Utc};
use ethers::types::Address;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::chain::ChainClient;
use crate::contracts::voting::VotingContract;
use crate::flows::{TransferFlow, VotingFlow};
use crate::gateway::protocol::GatewayEvent;
use crate::gateway::EventBroadcaster;

pub struct DappSession {
    pub id: String,
    pub transfer: Arc<TransferFlow>,
    pub voting: Option<Arc<VotingFlow>>,
    pub started_at: DateTime<Utc>,
    cancel: CancellationToken,
}

impl DappSession {
    fn new(
        chain: Arc<dyn ChainClient>,
        chain_id: u64,
        voting_contract: Option<Address>,
        broadcaster: Arc<EventBroadcaster>,
    ) -> Result<Self, String> {
        let cancel = CancellationToken::new();

        let transfer = Arc::new(TransferFlow::new(
            chain.clone(),
            chain_id,
            Some(broadcaster.clone()),
            cancel.child_token(),
        ));

        let voting = match voting_contract {
            Some(address) => {
                let contract = VotingContract::new(address, chain.clone())?;
                Some(Arc::new(VotingFlow::new(
                    contract,
                    chain,
                    chain_id,
                    Some(broadcaster),
                    cancel.child_token(),
                )))
            }
            None => None,
        };

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            transfer,
            voting,
            started_at: Utc::now(),
            cancel,
        })
    }
}

impl Drop for DappSession {
    fn drop(&mut self) {
        self.cancel.cancel();
        log::debug!("[SESSION] Session {} dropped", self.id);
    }
}

/// Holds the current session and builds replacements
pub struct SessionManager {
    chain: Arc<dyn ChainClient>,
    chain_id: u64,
    voting_contract: Option<Address>,
    broadcaster: Arc<EventBroadcaster>,
    current: RwLock<Arc<DappSession>>,
}

impl SessionManager {
    /// Create the manager and mount the first session
    pub async fn start(
        chain: Arc<dyn ChainClient>,
        chain_id: u64,
        voting_contract: Option<Address>,
        broadcaster: Arc<EventBroadcaster>,
    ) -> Result<Self, String> {
        let session = Self::mount(&chain, chain_id, voting_contract, &broadcaster).await?;
        Ok(Self {
            chain,
            chain_id,
            voting_contract,
            broadcaster,
            current: RwLock::new(session),
        })
    }

    async fn mount(
        chain: &Arc<dyn ChainClient>,
        chain_id: u64,
        voting_contract: Option<Address>,
        broadcaster: &Arc<EventBroadcaster>,
    ) -> Result<Arc<DappSession>, String> {
        let session = DappSession::new(chain.clone(), chain_id, voting_contract, broadcaster.clone())?;
        if let Some(voting) = &session.voting {
            voting.refresh().await;
        }
        log::info!(
            "[SESSION] Session {} started (voting {})",
            session.id,
            if session.voting.is_some() { "enabled" } else { "disabled" }
        );
        Ok(Arc::new(session))
    }

    pub fn current(&self) -> Arc<DappSession> {
        self.current.read().clone()
    }

    /// Replace the current session. The old one is cancelled immediately;
    /// requests still holding it finish against its frozen state.
    pub async fn reset(&self) -> Result<Arc<DappSession>, String> {
        let session =
            Self::mount(&self.chain, self.chain_id, self.voting_contract, &self.broadcaster).await?;

        let previous = std::mem::replace(&mut *self.current.write(), session.clone());
        previous.cancel.cancel();
        log::info!("[SESSION] Session {} replaced by {}", previous.id, session.id);

        self.broadcaster.broadcast(GatewayEvent::session_reset(&session.id));
        Ok(session)
    }
}
