//! Shared types for the dashboard backend and its API clients.

use serde::{Deserialize, Serialize};

// =====================================================
// Transaction lifecycle
// =====================================================

/// Status of a tracked transaction flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TxStatus {
    /// Nothing submitted yet, or a new dispatch just started
    Idle,
    /// Submitted, waiting for confirmation
    Pending,
    /// Confirmed on-chain
    Success,
    /// Rejected, reverted, or timed out
    Error,
}

impl std::fmt::Display for TxStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TxStatus::Idle => write!(f, "idle"),
            TxStatus::Pending => write!(f, "pending"),
            TxStatus::Success => write!(f, "success"),
            TxStatus::Error => write!(f, "error"),
        }
    }
}

/// Which user flow a transaction belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowKind {
    Transfer,
    Vote,
}

impl std::fmt::Display for FlowKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowKind::Transfer => write!(f, "transfer"),
            FlowKind::Vote => write!(f, "vote"),
        }
    }
}

/// Error categories reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputValidation,
    SubmissionRejection,
    ConfirmationFailure,
    PreconditionViolation,
}

/// Point-in-time view of a flow's tracker
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TxStateView {
    pub flow: FlowKind,
    pub status: TxStatus,
    pub tx_hash: Option<String>,
    pub error: Option<String>,
    /// True from dispatch until the flow reaches success or error
    pub is_loading: bool,
    pub is_success: bool,
    pub is_error: bool,
    pub updated_at: String,
}

// =====================================================
// Transfer
// =====================================================

/// Body of POST /api/transfer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequest {
    pub to: String,
    pub amount: String,
}

/// Form values retained until the transfer confirms
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferDraft {
    pub to: String,
    pub amount: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferView {
    pub is_connected: bool,
    pub draft: Option<TransferDraft>,
    pub state: TxStateView,
}

// =====================================================
// Voting
// =====================================================

/// Body of POST /api/voting/vote
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRequest {
    pub option: String,
}

/// A voting option paired with its on-chain count
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteOption {
    pub label: String,
    pub count: u64,
}

/// A voting option with its share of the total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoteTally {
    pub label: String,
    pub count: u64,
    pub percentage: f64,
    pub percentage_display: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingView {
    pub contract_address: String,
    pub is_connected: bool,
    pub options: Option<Vec<String>>,
    pub loading_options: bool,
    pub votes: Option<Vec<VoteTally>>,
    pub total_votes: u64,
    pub has_voted: Option<bool>,
    pub can_vote: bool,
    pub state: TxStateView,
}

// =====================================================
// Dashboard
// =====================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainView {
    pub id: u64,
    pub name: String,
    pub native_symbol: String,
    pub explorer_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceView {
    /// Base units as a decimal string
    pub value: String,
    /// Display units, 4 decimal places
    pub formatted: String,
    pub symbol: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VotingSummary {
    pub enabled: bool,
    pub loading_options: bool,
    pub option_count: usize,
    pub total_votes: u64,
    pub has_voted: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardView {
    pub is_connected: bool,
    pub address: Option<String>,
    pub short_address: Option<String>,
    pub chain: Option<ChainView>,
    pub balance: Option<BalanceView>,
    pub block_number: Option<u64>,
    pub voting: VotingSummary,
}

// =====================================================
// Navigation
// =====================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub name: String,
    pub path: String,
}

/// Front-end routes, in menu order
pub fn nav_menu() -> Vec<NavItem> {
    [
        ("Dashboard", "/"),
        ("Transfer Assets", "/transfer-assets"),
        ("Voting", "/voting"),
    ]
    .into_iter()
    .map(|(name, path)| NavItem {
        name: name.to_string(),
        path: path.to_string(),
    })
    .collect()
}

// =====================================================
// API envelopes
// =====================================================

/// Response to a successful dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatchResponse {
    pub success: bool,
    pub tx_hash: String,
    pub state: TxStateView,
}

/// Error body returned by every endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    pub kind: Option<ErrorKind>,
}

impl ApiError {
    pub fn new(error: impl Into<String>, kind: Option<ErrorKind>) -> Self {
        Self {
            success: false,
            error: error.into(),
            kind,
        }
    }
}
