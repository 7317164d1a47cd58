//! Side-effect-free admission checks for proof submissions.
//!
//! Checks run in a fixed order so that the reported failure is deterministic:
//! request lookup, completion, signal decoding, request binding, credential
//! binding, revocation, nullifier reuse.

use zkyc_core::{FieldElement, ProtocolError, PublicSignals, RequestId, VerificationRequest};
use zkyc_registry::CredentialRegistry;

use crate::nullifiers::NullifierSet;
use crate::sessions::SessionBook;

/// A submission that passed every ledger-side check.
#[derive(Debug, Clone)]
pub struct AdmittedSubmission {
    pub request: VerificationRequest,
    pub signals: PublicSignals,
}

pub fn check_submission(
    registry: &CredentialRegistry,
    sessions: &SessionBook,
    nullifiers: &NullifierSet,
    request_id: RequestId,
    public_signals: &[FieldElement],
) -> Result<AdmittedSubmission, ProtocolError> {
    let request = sessions.get(request_id)?;
    if request.is_completed() {
        return Err(ProtocolError::AlreadyCompleted { request_id });
    }

    let signals = PublicSignals::decode(request.kind, public_signals)?;

    let mismatch = |signal: &'static str| ProtocolError::CommitmentMismatch { request_id, signal };
    if signals.request_id != request_id.to_field() {
        return Err(mismatch("requestId"));
    }
    if signals.requester != request.requester.to_field() {
        return Err(mismatch("requesterIdentifier"));
    }
    let commitments = registry.get_commitments(&request.subject)?;
    if signals.credential_commitment != request.kind.bound_commitment(&commitments) {
        return Err(mismatch(request.kind.commitment_signal()));
    }
    if signals.secret_hash != commitments.secret_hash {
        return Err(mismatch("secretHash"));
    }

    if registry.is_secret_hash_revoked(&signals.secret_hash) {
        return Err(ProtocolError::CredentialRevoked {
            request_id,
            subject: request.subject,
        });
    }

    if nullifiers.contains(&signals.nullifier_hash) {
        return Err(ProtocolError::NullifierReused {
            request_id,
            nullifier: signals.nullifier_hash,
        });
    }

    Ok(AdmittedSubmission {
        request: request.clone(),
        signals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use zkyc_core::{
        AccountId, Amount, CredentialCommitments, ErrorKind, PredicateKind, PredicateParams,
        VerificationState,
    };

    fn issuer() -> AccountId {
        AccountId::from_low_u64(1)
    }
    fn subject() -> AccountId {
        AccountId::from_low_u64(100)
    }
    fn requester() -> AccountId {
        AccountId::from_low_u64(50)
    }

    fn commitments() -> CredentialCommitments {
        CredentialCommitments {
            aadhaar_hash: FieldElement::from_u64(1001),
            secret_hash: FieldElement::from_u64(1002),
            state_commitment: FieldElement::from_u64(1003),
        }
    }

    fn setup(kind: PredicateKind) -> (CredentialRegistry, SessionBook, NullifierSet) {
        let mut registry = CredentialRegistry::new(issuer());
        registry.issue(&issuer(), subject(), "card", commitments()).unwrap();
        let mut sessions = SessionBook::new();
        sessions.apply_created(VerificationRequest {
            id: RequestId(1),
            kind,
            requester: requester(),
            subject: subject(),
            params: match kind {
                PredicateKind::AgeThreshold => PredicateParams::AgeThreshold,
                PredicateKind::StateEquality => PredicateParams::StateEquality { required_state: 27 },
            },
            fee: Amount(1000),
            state: VerificationState::Pending,
            result: false,
            nullifier_hash: None,
            created_at: Utc::now(),
            completed_at: None,
        });
        (registry, sessions, NullifierSet::new())
    }

    fn signals(kind: PredicateKind) -> Vec<FieldElement> {
        PublicSignals {
            result: true,
            nullifier_hash: FieldElement::from_u64(555),
            request_id: RequestId(1).to_field(),
            requester: requester().to_field(),
            credential_commitment: kind.bound_commitment(&commitments()),
            secret_hash: commitments().secret_hash,
        }
        .encode()
    }

    fn kind_of(
        parts: &(CredentialRegistry, SessionBook, NullifierSet),
        id: u64,
        s: &[FieldElement],
    ) -> ErrorKind {
        check_submission(&parts.0, &parts.1, &parts.2, RequestId(id), s)
            .unwrap_err()
            .kind()
    }

    #[test]
    fn test_admits_matching_submission() {
        for kind in PredicateKind::ALL {
            let (registry, sessions, nullifiers) = setup(kind);
            let admitted =
                check_submission(&registry, &sessions, &nullifiers, RequestId(1), &signals(kind))
                    .unwrap();
            assert!(admitted.signals.result);
            assert_eq!(admitted.request.kind, kind);
        }
    }

    #[test]
    fn test_unknown_request() {
        let parts = setup(PredicateKind::AgeThreshold);
        assert_eq!(
            kind_of(&parts, 2, &signals(PredicateKind::AgeThreshold)),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn test_each_binding_signal_checked() {
        let parts = setup(PredicateKind::AgeThreshold);
        for (index, name) in [(2, "requestId"), (3, "requesterIdentifier"), (4, "aadhaarHash"), (5, "secretHash")] {
            let mut s = signals(PredicateKind::AgeThreshold);
            s[index] = FieldElement::from_u64(9_999);
            let err = check_submission(&parts.0, &parts.1, &parts.2, RequestId(1), &s).unwrap_err();
            assert_eq!(
                err,
                ProtocolError::CommitmentMismatch {
                    request_id: RequestId(1),
                    signal: name
                }
            );
        }
    }

    #[test]
    fn test_state_kind_binds_state_commitment() {
        let parts = setup(PredicateKind::StateEquality);
        // An aadhaarHash in the commitment slot is not accepted for a state request.
        let mut s = signals(PredicateKind::StateEquality);
        s[4] = commitments().aadhaar_hash;
        let err = check_submission(&parts.0, &parts.1, &parts.2, RequestId(1), &s).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::CommitmentMismatch {
                request_id: RequestId(1),
                signal: "stateCommitment"
            }
        );
    }

    #[test]
    fn test_revoked_after_request() {
        let mut parts = setup(PredicateKind::AgeThreshold);
        parts.0.revoke(&issuer(), &subject()).unwrap();
        assert_eq!(
            kind_of(&parts, 1, &signals(PredicateKind::AgeThreshold)),
            ErrorKind::CredentialRevoked
        );
    }

    #[test]
    fn test_nullifier_reuse() {
        let mut parts = setup(PredicateKind::AgeThreshold);
        parts.2.insert(FieldElement::from_u64(555), RequestId(77));
        assert_eq!(
            kind_of(&parts, 1, &signals(PredicateKind::AgeThreshold)),
            ErrorKind::NullifierReused
        );
    }

    #[test]
    fn test_malformed_signals() {
        let parts = setup(PredicateKind::AgeThreshold);
        let short = &signals(PredicateKind::AgeThreshold)[..5];
        assert_eq!(kind_of(&parts, 1, short), ErrorKind::InvalidInput);
    }
}
