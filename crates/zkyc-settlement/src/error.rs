use uuid::Uuid;
use zkyc_core::{AccountId, Amount, ProtocolError};

/// Settlement-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum SettlementError {
    #[error("settlement not found: {0}")]
    NotFound(Uuid),

    #[error("invalid settlement state transition: {0}")]
    InvalidStateTransition(String),

    #[error("insufficient balance for {account}: available {available}, required {required}")]
    InsufficientBalance {
        account: AccountId,
        available: Amount,
        required: Amount,
    },

    #[error("settlement has no legs")]
    Empty,

    #[error("deposits are disabled on this rail")]
    DepositsDisabled,

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SettlementError> for ProtocolError {
    fn from(e: SettlementError) -> Self {
        ProtocolError::PaymentFailed(e.to_string())
    }
}
