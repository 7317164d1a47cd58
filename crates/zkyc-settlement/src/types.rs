use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use zkyc_core::{AccountId, Amount};

/// Unique identifier for a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SettlementId(pub Uuid);

impl SettlementId {
    /// Create a new settlement ID (UUID v7, time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for SettlementId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SettlementId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The lifecycle status of a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementStatus {
    /// Funds are held from the senders but not yet credited.
    Initiated,
    /// Receivers have been credited.
    Confirmed,
    /// Holds released or credits reversed.
    RolledBack,
}

impl std::fmt::Display for SettlementStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Initiated => write!(f, "Initiated"),
            Self::Confirmed => write!(f, "Confirmed"),
            Self::RolledBack => write!(f, "RolledBack"),
        }
    }
}

/// One transfer inside a settlement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferLeg {
    pub from: AccountId,
    pub to: AccountId,
    pub amount: Amount,
}

impl TransferLeg {
    pub fn new(from: AccountId, to: AccountId, amount: Amount) -> Self {
        Self { from, to, amount }
    }
}

/// Proof that a settlement completed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementReceipt {
    pub settlement_id: SettlementId,
    /// Rail that processed the settlement.
    pub rail_id: String,
    pub status: SettlementStatus,
    pub legs: Vec<TransferLeg>,
    pub confirmed_at: DateTime<Utc>,
    /// Caller-supplied reference, e.g. `request-7/payout`.
    pub memo: String,
}

impl SettlementReceipt {
    pub fn total(&self) -> Amount {
        Amount(self.legs.iter().map(|l| l.amount.units()).sum())
    }
}
