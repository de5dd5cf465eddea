use dashboard_types::{TxStateView, VoteTally};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Event pushed to WebSocket clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayEvent {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub event: String,
    pub data: Value,
}

impl GatewayEvent {
    pub fn new(event: impl Into<String>, data: Value) -> Self {
        Self {
            msg_type: "event".to_string(),
            event: event.into(),
            data,
        }
    }

    /// Every tracker transition
    pub fn tx_status(state: &TxStateView) -> Self {
        Self::new("tx.status", json!(state))
    }

    pub fn tx_pending(state: &TxStateView, explorer_url: Option<&str>) -> Self {
        Self::new(
            "tx.pending",
            json!({
                "flow": state.flow,
                "tx_hash": state.tx_hash,
                "explorer_url": explorer_url,
            }),
        )
    }

    pub fn tx_confirmed(state: &TxStateView, block_number: Option<u64>) -> Self {
        Self::new(
            "tx.confirmed",
            json!({
                "flow": state.flow,
                "tx_hash": state.tx_hash,
                "block_number": block_number,
            }),
        )
    }

    pub fn tx_failed(state: &TxStateView) -> Self {
        Self::new(
            "tx.failed",
            json!({
                "flow": state.flow,
                "tx_hash": state.tx_hash,
                "error": state.error,
            }),
        )
    }

    pub fn votes_updated(votes: &[VoteTally], total_votes: u64) -> Self {
        Self::new(
            "votes.updated",
            json!({
                "votes": votes,
                "total_votes": total_votes,
            }),
        )
    }

    pub fn session_reset(session_id: &str) -> Self {
        Self::new("session.reset", json!({ "session_id": session_id }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dashboard_types::{FlowKind, TxStatus};

    fn state() -> TxStateView {
        TxStateView {
            flow: FlowKind::Vote,
            status: TxStatus::Error,
            tx_hash: Some("0x01".to_string()),
            error: Some("reverted".to_string()),
            is_loading: false,
            is_success: false,
            is_error: true,
            updated_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_event_envelope() {
        let json = serde_json::to_value(GatewayEvent::tx_failed(&state())).unwrap();
        assert_eq!(json["type"], "event");
        assert_eq!(json["event"], "tx.failed");
        assert_eq!(json["data"]["flow"], "vote");
        assert_eq!(json["data"]["error"], "reverted");
    }

    #[test]
    fn test_status_event_carries_full_state() {
        let event = GatewayEvent::tx_status(&state());
        assert_eq!(event.data["status"], "error");
        assert_eq!(event.data["is_error"], true);
    }
}
