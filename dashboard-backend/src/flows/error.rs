use dashboard_types::ErrorKind;
use thiserror::Error;

use crate::chain::ChainError;

/// Shown when an external error carries no message
pub const UNKNOWN_ERROR: &str = "An unknown error occurred";

/// Why a transfer or vote dispatch did not go through
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FlowError {
    #[error("Invalid amount '{amount}': {reason}")]
    InvalidAmount { amount: String, reason: String },
    #[error("Invalid recipient address '{0}'")]
    InvalidAddress(String),
    #[error("Unknown voting option '{0}'")]
    UnknownOption(String),
    #[error("A transaction is already pending")]
    AlreadyPending,
    #[error("This account has already voted")]
    AlreadyVoted,
    #[error("Wallet not connected")]
    NotConnected,
    #[error("Voting contract not configured")]
    ContractNotConfigured,
    #[error("{0}")]
    Rejected(String),
    #[error("{0}")]
    ConfirmationFailed(String),
}

impl FlowError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            FlowError::InvalidAmount { .. }
            | FlowError::InvalidAddress(_)
            | FlowError::UnknownOption(_) => ErrorKind::InputValidation,
            FlowError::Rejected(_) => ErrorKind::SubmissionRejection,
            FlowError::ConfirmationFailed(_) => ErrorKind::ConfirmationFailure,
            FlowError::AlreadyPending
            | FlowError::AlreadyVoted
            | FlowError::NotConnected
            | FlowError::ContractNotConfigured => ErrorKind::PreconditionViolation,
        }
    }

    /// Message stored as the tracker's error detail
    pub fn detail(&self) -> String {
        error_detail(&self.to_string())
    }
}

/// Errors from the submission step. Failures while waiting for a receipt are
/// mapped by the watcher instead.
impl From<ChainError> for FlowError {
    fn from(err: ChainError) -> Self {
        match err {
            ChainError::NotConnected => FlowError::NotConnected,
            ChainError::Rejected(msg) => FlowError::Rejected(msg),
            ChainError::Reverted(_) | ChainError::Timeout(_, _) => {
                FlowError::ConfirmationFailed(err.to_string())
            }
            ChainError::Rpc(_) | ChainError::Decode(_) => FlowError::Rejected(err.to_string()),
        }
    }
}

pub fn error_detail(message: &str) -> String {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        UNKNOWN_ERROR.to_string()
    } else {
        trimmed.to_string()
    }
}
