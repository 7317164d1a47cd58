use async_trait::async_trait;
use zkyc_core::{AccountId, Amount};

use crate::error::SettlementError;
use crate::types::{SettlementId, SettlementReceipt, SettlementStatus, TransferLeg};

/// Payment rail interface.
///
/// A settlement is a batch of legs that succeeds or fails as a unit.
/// `initiate` reserves the senders' funds, so once it returns `confirm` only
/// fails on a programming error. `rollback` works from both `Initiated` and
/// `Confirmed`.
#[async_trait]
pub trait PaymentRail: Send + Sync {
    async fn initiate(
        &self,
        legs: Vec<TransferLeg>,
        memo: String,
    ) -> Result<SettlementId, SettlementError>;

    async fn confirm(&self, settlement_id: SettlementId)
        -> Result<SettlementReceipt, SettlementError>;

    async fn rollback(&self, settlement_id: SettlementId) -> Result<(), SettlementError>;

    async fn get_status(
        &self,
        settlement_id: SettlementId,
    ) -> Result<SettlementStatus, SettlementError>;

    /// Spendable balance of an account.
    async fn balance(&self, account: &AccountId) -> Result<Amount, SettlementError>;

    /// Credit an account from outside the rail. Rails backed by a real
    /// currency refuse this.
    async fn deposit(&self, account: &AccountId, amount: Amount) -> Result<Amount, SettlementError>;

    /// Return the unique identifier of this rail (e.g. "rail-internal").
    fn rail_id(&self) -> &str;
}
