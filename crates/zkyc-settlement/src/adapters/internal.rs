use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::sync::Mutex;
use uuid::Uuid;
use zkyc_core::{AccountId, Amount};

use crate::error::SettlementError;
use crate::traits::PaymentRail;
use crate::types::{SettlementId, SettlementReceipt, SettlementStatus, TransferLeg};

/// An individual entry in the double-entry book.
#[derive(Debug, Clone)]
struct LedgerEntry {
    account: AccountId,
    /// Positive = credit, negative = debit.
    delta: i128,
    settlement_id: SettlementId,
}

#[derive(Debug, Clone)]
struct InternalSettlement {
    legs: Vec<TransferLeg>,
    memo: String,
    status: SettlementStatus,
}

/// In-memory double-entry rail.
///
/// Senders are debited at `initiate` and receivers credited at `confirm`.
/// Balances never go negative.
pub struct InternalRail {
    settlements: DashMap<Uuid, InternalSettlement>,
    entries: DashMap<Uuid, LedgerEntry>,
    balances: DashMap<AccountId, u128>,
    allow_deposits: bool,
    /// Serializes multi-account balance updates.
    posting: Mutex<()>,
}

impl InternalRail {
    pub fn new(allow_deposits: bool) -> Self {
        Self {
            settlements: DashMap::new(),
            entries: DashMap::new(),
            balances: DashMap::new(),
            allow_deposits,
            posting: Mutex::new(()),
        }
    }

    pub fn get_balance(&self, account: &AccountId) -> Amount {
        Amount(self.balances.get(account).map(|v| *v).unwrap_or(0))
    }

    /// Net movement per settlement for an account, in posting order.
    pub fn entries_for(&self, account: &AccountId) -> Vec<(SettlementId, i128)> {
        let mut out: Vec<(Uuid, SettlementId, i128)> = self
            .entries
            .iter()
            .filter(|e| e.account == *account)
            .map(|e| (*e.key(), e.settlement_id, e.delta))
            .collect();
        out.sort_by_key(|(id, _, _)| *id);
        out.into_iter().map(|(_, sid, delta)| (sid, delta)).collect()
    }

    fn record(&self, settlement_id: SettlementId, account: AccountId, delta: i128) {
        self.entries.insert(
            Uuid::now_v7(),
            LedgerEntry {
                account,
                delta,
                settlement_id,
            },
        );
    }

    fn lock_posting(&self) -> Result<std::sync::MutexGuard<'_, ()>, SettlementError> {
        self.posting
            .lock()
            .map_err(|_| SettlementError::Internal("posting lock poisoned".into()))
    }

    /// Check every account can cover `required`, then debit all of them.
    fn debit_all(
        &self,
        settlement_id: SettlementId,
        required: &BTreeMap<AccountId, u128>,
    ) -> Result<(), SettlementError> {
        for (account, amount) in required {
            let available = self.get_balance(account);
            if available.units() < *amount {
                return Err(SettlementError::InsufficientBalance {
                    account: *account,
                    available,
                    required: Amount(*amount),
                });
            }
        }
        for (account, amount) in required {
            self.balances
                .entry(*account)
                .and_modify(|b| *b -= *amount)
                .or_insert(0);
            self.record(settlement_id, *account, -(*amount as i128));
        }
        Ok(())
    }

    fn credit_all(
        &self,
        settlement_id: SettlementId,
        credits: &BTreeMap<AccountId, u128>,
    ) -> Result<(), SettlementError> {
        for (account, amount) in credits {
            let mut balance = self.balances.entry(*account).or_insert(0);
            *balance = balance.checked_add(*amount).ok_or_else(|| {
                SettlementError::Internal(format!("balance overflow for {}", account))
            })?;
            drop(balance);
            self.record(settlement_id, *account, *amount as i128);
        }
        Ok(())
    }

    fn totals(legs: &[TransferLeg], by_sender: bool) -> BTreeMap<AccountId, u128> {
        let mut totals = BTreeMap::new();
        for leg in legs {
            let account = if by_sender { leg.from } else { leg.to };
            *totals.entry(account).or_insert(0u128) += leg.amount.units();
        }
        totals
    }
}

#[async_trait]
impl PaymentRail for InternalRail {
    async fn initiate(
        &self,
        legs: Vec<TransferLeg>,
        memo: String,
    ) -> Result<SettlementId, SettlementError> {
        if legs.is_empty() {
            return Err(SettlementError::Empty);
        }
        let settlement_id = SettlementId::new();
        {
            let _guard = self.lock_posting()?;
            self.debit_all(settlement_id, &Self::totals(&legs, true))?;
        }
        self.settlements.insert(
            settlement_id.0,
            InternalSettlement {
                legs,
                memo,
                status: SettlementStatus::Initiated,
            },
        );
        tracing::info!(settlement_id = %settlement_id, "internal settlement initiated");
        Ok(settlement_id)
    }

    async fn confirm(
        &self,
        settlement_id: SettlementId,
    ) -> Result<SettlementReceipt, SettlementError> {
        let mut entry = self
            .settlements
            .get_mut(&settlement_id.0)
            .ok_or(SettlementError::NotFound(settlement_id.0))?;
        let record = entry.value_mut();

        if record.status != SettlementStatus::Initiated {
            return Err(SettlementError::InvalidStateTransition(format!(
                "cannot confirm settlement in status {}",
                record.status
            )));
        }

        {
            let _guard = self.lock_posting()?;
            self.credit_all(settlement_id, &Self::totals(&record.legs, false))?;
        }
        record.status = SettlementStatus::Confirmed;

        tracing::info!(settlement_id = %settlement_id, memo = %record.memo, "internal settlement confirmed");
        Ok(SettlementReceipt {
            settlement_id,
            rail_id: self.rail_id().to_string(),
            status: SettlementStatus::Confirmed,
            legs: record.legs.clone(),
            confirmed_at: Utc::now(),
            memo: record.memo.clone(),
        })
    }

    async fn rollback(&self, settlement_id: SettlementId) -> Result<(), SettlementError> {
        let mut entry = self
            .settlements
            .get_mut(&settlement_id.0)
            .ok_or(SettlementError::NotFound(settlement_id.0))?;
        let record = entry.value_mut();

        {
            let _guard = self.lock_posting()?;
            match record.status {
                SettlementStatus::Initiated => {}
                SettlementStatus::Confirmed => {
                    self.debit_all(settlement_id, &Self::totals(&record.legs, false))?;
                }
                SettlementStatus::RolledBack => {
                    return Err(SettlementError::InvalidStateTransition(
                        "settlement already rolled back".into(),
                    ));
                }
            }
            self.credit_all(settlement_id, &Self::totals(&record.legs, true))?;
        }

        record.status = SettlementStatus::RolledBack;
        tracing::warn!(settlement_id = %settlement_id, memo = %record.memo, "internal settlement rolled back");
        Ok(())
    }

    async fn get_status(
        &self,
        settlement_id: SettlementId,
    ) -> Result<SettlementStatus, SettlementError> {
        let entry = self
            .settlements
            .get(&settlement_id.0)
            .ok_or(SettlementError::NotFound(settlement_id.0))?;
        Ok(entry.status)
    }

    async fn balance(&self, account: &AccountId) -> Result<Amount, SettlementError> {
        Ok(self.get_balance(account))
    }

    async fn deposit(&self, account: &AccountId, amount: Amount) -> Result<Amount, SettlementError> {
        if !self.allow_deposits {
            return Err(SettlementError::DepositsDisabled);
        }
        let settlement_id = SettlementId::new();
        let mut credits = BTreeMap::new();
        credits.insert(*account, amount.units());
        {
            let _guard = self.lock_posting()?;
            self.credit_all(settlement_id, &credits)?;
        }
        tracing::info!(account = %account, amount = %amount, "deposit credited");
        Ok(self.get_balance(account))
    }

    fn rail_id(&self) -> &str {
        "rail-internal"
    }
}
