use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use zkyc_core::{AccountId, CredentialCommitments, ProtocolError};
use zkyc_crypto::{parse_aadhaar_number, parse_birth_date, CredentialOpening, FieldHasher};

use crate::states::state_code;

/// Everything the issuer produces for one subject: the public commitments for
/// the registry and the private opening handed to the subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedCredential {
    pub subject: AccountId,
    pub label: String,
    pub commitments: CredentialCommitments,
    pub opening: CredentialOpening,
}

/// Issuer-side credential preparation.
pub struct CredentialIssuer {
    account: AccountId,
    hasher: Arc<dyn FieldHasher>,
}

impl CredentialIssuer {
    pub fn new(account: AccountId, hasher: Arc<dyn FieldHasher>) -> Self {
        Self { account, hasher }
    }

    pub fn account(&self) -> AccountId {
        self.account
    }

    /// Validate raw attributes, draw fresh salts and a secret, and derive the
    /// commitments.
    ///
    /// `state` is a state name or census code.
    pub fn prepare<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
        subject: AccountId,
        label: &str,
        aadhaar_number: &str,
        birth_date: &str,
        state: &str,
    ) -> Result<PreparedCredential, ProtocolError> {
        let aadhaar_number = parse_aadhaar_number(aadhaar_number)?;
        let birth_date = parse_birth_date(birth_date)?;
        let state_code = state_code(state)?;

        let opening = CredentialOpening::generate(rng, aadhaar_number, birth_date, state_code);
        let commitments = opening.commitments(self.hasher.as_ref());

        tracing::debug!(
            issuer = %self.account,
            subject = %subject,
            hasher = self.hasher.name(),
            "credential prepared"
        );

        Ok(PreparedCredential {
            subject,
            label: label.to_string(),
            commitments,
            opening,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use zkyc_core::ErrorKind;
    use zkyc_crypto::PoseidonHasher;

    fn issuer() -> CredentialIssuer {
        CredentialIssuer::new(AccountId::from_low_u64(1), Arc::new(PoseidonHasher))
    }

    #[test]
    fn test_prepare_matches_opening() {
        let mut rng = StdRng::seed_from_u64(1);
        let prepared = issuer()
            .prepare(
                &mut rng,
                AccountId::from_low_u64(100),
                "Alice",
                "123456789012",
                "1999-04-01",
                "Karnataka",
            )
            .unwrap();
        assert_eq!(prepared.opening.state_code, 29);
        assert_eq!(
            prepared.opening.commitments(&PoseidonHasher),
            prepared.commitments
        );
    }

    #[test]
    fn test_prepare_rejects_bad_input() {
        let mut rng = StdRng::seed_from_u64(1);
        let subject = AccountId::from_low_u64(100);
        let err = issuer()
            .prepare(&mut rng, subject, "x", "123", "1999-04-01", "Delhi")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = issuer()
            .prepare(&mut rng, subject, "x", "123456789012", "1999-13-01", "Delhi")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);

        let err = issuer()
            .prepare(&mut rng, subject, "x", "123456789012", "1999-01-01", "Narnia")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
