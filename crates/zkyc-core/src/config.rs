use serde::{Deserialize, Serialize};

use crate::error::ProtocolError;
use crate::types::{AccountId, Amount, PredicateKind};

/// 0.001 ETH in wei.
pub const DEFAULT_MINIMUM_FEE: Amount = Amount(1_000_000_000_000_000);

/// Subject share of a settled fee, in basis points (10%).
pub const DEFAULT_SUBJECT_REWARD_BPS: u16 = 1000;

pub const PROTOCOL_VERSION: &str = "zkyc/1";

/// Per-kind policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PredicatePolicy {
    #[serde(default = "default_minimum_fee")]
    pub minimum_fee: Amount,
}

impl Default for PredicatePolicy {
    fn default() -> Self {
        Self {
            minimum_fee: DEFAULT_MINIMUM_FEE,
        }
    }
}

/// Deployment-wide protocol parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// The single account allowed to issue and revoke credentials.
    #[serde(default = "default_issuer")]
    pub issuer: AccountId,
    /// Receives the remainder of every settled fee.
    #[serde(default = "default_treasury")]
    pub treasury: AccountId,
    /// Holds fees between request creation and settlement.
    #[serde(default = "default_escrow")]
    pub escrow: AccountId,
    #[serde(default = "default_subject_reward_bps")]
    pub subject_reward_bps: u16,
    #[serde(default)]
    pub age_threshold: PredicatePolicy,
    #[serde(default)]
    pub state_equality: PredicatePolicy,
}

fn default_minimum_fee() -> Amount {
    DEFAULT_MINIMUM_FEE
}
fn default_issuer() -> AccountId {
    AccountId::from_low_u64(1)
}
fn default_treasury() -> AccountId {
    AccountId::from_low_u64(2)
}
fn default_escrow() -> AccountId {
    AccountId::from_low_u64(3)
}
fn default_subject_reward_bps() -> u16 {
    DEFAULT_SUBJECT_REWARD_BPS
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            issuer: default_issuer(),
            treasury: default_treasury(),
            escrow: default_escrow(),
            subject_reward_bps: DEFAULT_SUBJECT_REWARD_BPS,
            age_threshold: PredicatePolicy::default(),
            state_equality: PredicatePolicy::default(),
        }
    }
}

impl ProtocolConfig {
    pub fn policy(&self, kind: PredicateKind) -> &PredicatePolicy {
        match kind {
            PredicateKind::AgeThreshold => &self.age_threshold,
            PredicateKind::StateEquality => &self.state_equality,
        }
    }

    pub fn minimum_fee(&self, kind: PredicateKind) -> Amount {
        self.policy(kind).minimum_fee
    }

    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.subject_reward_bps > 10_000 {
            return Err(ProtocolError::InvalidInput(format!(
                "subject_reward_bps must be at most 10000, got {}",
                self.subject_reward_bps
            )));
        }
        if self.issuer == self.treasury
            || self.issuer == self.escrow
            || self.treasury == self.escrow
        {
            return Err(ProtocolError::InvalidInput(
                "issuer, treasury and escrow must be distinct accounts".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProtocolConfig::default();
        assert_eq!(config.subject_reward_bps, 1000);
        assert_eq!(
            config.minimum_fee(PredicateKind::AgeThreshold),
            Amount(1_000_000_000_000_000)
        );
        assert_eq!(
            config.minimum_fee(PredicateKind::StateEquality),
            DEFAULT_MINIMUM_FEE
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_serde_fills_defaults() {
        let config: ProtocolConfig =
            serde_json::from_str(r#"{"subject_reward_bps": 2500}"#).unwrap();
        assert_eq!(config.subject_reward_bps, 2500);
        assert_eq!(config.issuer, AccountId::from_low_u64(1));
        assert_eq!(config.age_threshold.minimum_fee, DEFAULT_MINIMUM_FEE);
    }

    #[test]
    fn test_validate_rejects_excess_reward() {
        let config = ProtocolConfig {
            subject_reward_bps: 10_001,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_shared_accounts() {
        let config = ProtocolConfig {
            treasury: AccountId::from_low_u64(1),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
