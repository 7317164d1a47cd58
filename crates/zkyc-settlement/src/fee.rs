use zkyc_core::{AccountId, Amount};

use crate::types::TransferLeg;

/// How a settled fee is divided between the subject and the treasury.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeSplit {
    pub subject_reward: Amount,
    pub treasury_share: Amount,
}

impl FeeSplit {
    /// Subject gets `reward_bps` of the fee (rounded down), the treasury
    /// keeps the rest. The two parts always sum to the fee.
    pub fn compute(fee: Amount, reward_bps: u16) -> Self {
        let subject_reward = fee.basis_points(reward_bps.min(10_000));
        let treasury_share = Amount(fee.units() - subject_reward.units());
        Self {
            subject_reward,
            treasury_share,
        }
    }

    /// Payout legs from escrow. Zero-amount legs are omitted.
    pub fn payout_legs(
        &self,
        escrow: AccountId,
        subject: AccountId,
        treasury: AccountId,
    ) -> Vec<TransferLeg> {
        let mut legs = Vec::with_capacity(2);
        if self.subject_reward > Amount::ZERO {
            legs.push(TransferLeg::new(escrow, subject, self.subject_reward));
        }
        if self.treasury_share > Amount::ZERO {
            legs.push(TransferLeg::new(escrow, treasury, self.treasury_share));
        }
        legs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_ten_percent() {
        let split = FeeSplit::compute(Amount(1_000_000_000_000_000), 1000);
        assert_eq!(split.subject_reward, Amount(100_000_000_000_000));
        assert_eq!(split.treasury_share, Amount(900_000_000_000_000));
    }

    #[test]
    fn test_rounding_favors_treasury() {
        let split = FeeSplit::compute(Amount(19), 1000);
        assert_eq!(split.subject_reward, Amount(1));
        assert_eq!(split.treasury_share, Amount(18));
    }

    #[test]
    fn test_zero_legs_omitted() {
        let escrow = AccountId::from_low_u64(3);
        let subject = AccountId::from_low_u64(100);
        let treasury = AccountId::from_low_u64(2);

        let all_treasury = FeeSplit::compute(Amount(500), 0);
        let legs = all_treasury.payout_legs(escrow, subject, treasury);
        assert_eq!(legs, vec![TransferLeg::new(escrow, treasury, Amount(500))]);

        assert!(FeeSplit::compute(Amount::ZERO, 1000)
            .payout_legs(escrow, subject, treasury)
            .is_empty());
    }
}
