//! Integration test: issuer → requester → subject → settlement.
//!
//! Runs the full protocol over the development backend with the in-memory
//! store and rail.

use zkyc_core::{
    AccountId, Amount, ErrorKind, PredicateParams, ProtocolError, RequestId, VerificationOutcome,
    VerificationState,
};
use zkyc_integration_tests::{years_ago, Deployment, REQUESTER};
use zkyc_prover::ProofRequest;

fn subject() -> AccountId {
    AccountId::from_low_u64(100)
}

async fn funded() -> Deployment {
    let d = Deployment::new().unwrap();
    d.fund(REQUESTER, Amount(100 * d.minimum_fee().units()))
        .await
        .unwrap();
    d
}

// =========================================================================
// Age threshold
// =========================================================================

#[tokio::test]
async fn test_adult_proves_age() {
    let d = funded().await;
    d.enroll(subject(), years_ago(25), "Maharashtra").await.unwrap();

    let id = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();
    assert_eq!(d.ledger.get_pending_requests(&subject()).await, vec![id]);

    let proof = d.prove(subject(), id).await.unwrap();
    let outcome = d.submit(id, &proof).await.unwrap();
    assert_eq!(
        outcome,
        VerificationOutcome {
            completed: true,
            result: true
        }
    );
    assert_eq!(
        d.ledger.get_result(id).await.unwrap(),
        VerificationOutcome {
            completed: true,
            result: true
        }
    );
    assert!(d.ledger.get_pending_requests(&subject()).await.is_empty());
}

#[tokio::test]
async fn test_minor_gets_negative_result() {
    let d = funded().await;
    d.enroll(subject(), years_ago(10), "Delhi").await.unwrap();

    let id = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();
    let proof = d.prove(subject(), id).await.unwrap();
    d.submit(id, &proof).await.unwrap();

    assert_eq!(
        d.ledger.get_result(id).await.unwrap(),
        VerificationOutcome {
            completed: true,
            result: false
        }
    );
}

#[tokio::test]
async fn test_eighteenth_birthday_counts() {
    let d = funded().await;
    d.enroll(subject(), years_ago(18), "Gujarat").await.unwrap();

    let id = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();
    let proof = d.prove(subject(), id).await.unwrap();
    assert!(d.submit(id, &proof).await.unwrap().result);
}

// =========================================================================
// State equality
// =========================================================================

#[tokio::test]
async fn test_state_equality_for_two_subjects() {
    let d = funded().await;
    let alice = AccountId::from_low_u64(101);
    let bob = AccountId::from_low_u64(102);
    d.enroll(alice, years_ago(30), "Maharashtra").await.unwrap();
    d.enroll(bob, years_ago(30), "Karnataka").await.unwrap();

    let params = PredicateParams::StateEquality { required_state: 27 };
    let for_alice = d.request(alice, params.clone()).await.unwrap();
    let for_bob = d.request(bob, params).await.unwrap();

    let proof = d.prove(alice, for_alice).await.unwrap();
    assert!(d.submit(for_alice, &proof).await.unwrap().result);

    // Bob's proof is valid; it just says "not Maharashtra".
    let proof = d.prove(bob, for_bob).await.unwrap();
    let outcome = d.submit(for_bob, &proof).await.unwrap();
    assert!(outcome.completed);
    assert!(!outcome.result);
}

#[tokio::test]
async fn test_proof_for_own_state_does_not_answer_another() {
    let d = funded().await;
    d.enroll(subject(), years_ago(30), "Delhi").await.unwrap();
    let id = d
        .request(subject(), PredicateParams::StateEquality { required_state: 27 })
        .await
        .unwrap();

    // The holder proves "lives in Delhi" instead of answering for Maharashtra.
    let recorded = d.ledger.get_request(id).await.unwrap();
    let swapped = ProofRequest {
        params: PredicateParams::StateEquality { required_state: 7 },
        ..ProofRequest::from(&recorded)
    };
    let proof = d.prove_with(subject(), &swapped).await.unwrap();
    assert_eq!(proof.public_signals[0], zkyc_core::FieldElement::one());

    let err = d.submit(id, &proof).await.unwrap_err();
    assert_eq!(err, ProtocolError::InvalidProof { request_id: id });
    assert!(!d.ledger.get_result(id).await.unwrap().completed);

    // The honest answer settles as "not Maharashtra".
    let honest = d.prove(subject(), id).await.unwrap();
    let outcome = d.submit(id, &honest).await.unwrap();
    assert!(outcome.completed);
    assert!(!outcome.result);
}

#[tokio::test]
async fn test_unknown_state_code_is_refused() {
    let d = funded().await;
    d.enroll(subject(), years_ago(30), "Delhi").await.unwrap();
    let err = d
        .request(subject(), PredicateParams::StateEquality { required_state: 99 })
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

// =========================================================================
// Revocation
// =========================================================================

#[tokio::test]
async fn test_revoked_subject_cannot_be_requested() {
    let d = funded().await;
    d.enroll(subject(), years_ago(25), "Delhi").await.unwrap();
    d.ledger.revoke(&d.config.issuer, &subject()).await.unwrap();

    let err = d
        .request(subject(), PredicateParams::AgeThreshold)
        .await
        .unwrap_err();
    assert_eq!(err, ProtocolError::NoValidCredential { subject: subject() });
}

#[tokio::test]
async fn test_revocation_after_request_blocks_completion() {
    let d = funded().await;
    d.enroll(subject(), years_ago(25), "Delhi").await.unwrap();
    let id = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();
    let proof = d.prove(subject(), id).await.unwrap();

    d.ledger.revoke(&d.config.issuer, &subject()).await.unwrap();

    let err = d.submit(id, &proof).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::CredentialRevoked);
    assert_eq!(
        d.ledger.get_request(id).await.unwrap().state,
        VerificationState::Pending
    );
}

// =========================================================================
// Replay and binding
// =========================================================================

#[tokio::test]
async fn test_resubmission_is_already_completed() {
    let d = funded().await;
    d.enroll(subject(), years_ago(25), "Delhi").await.unwrap();
    let id = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();
    let proof = d.prove(subject(), id).await.unwrap();

    d.submit(id, &proof).await.unwrap();
    let err = d.submit(id, &proof).await.unwrap_err();
    assert_eq!(err, ProtocolError::AlreadyCompleted { request_id: id });
}

#[tokio::test]
async fn test_stale_commitment_is_mismatch() {
    let d = funded().await;
    d.enroll(subject(), years_ago(25), "Delhi").await.unwrap();
    let id = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();
    let stale = d.prove(subject(), id).await.unwrap();

    // Reissue with fresh salts; the outstanding proof commits to the old hash.
    d.enroll(subject(), years_ago(25), "Delhi").await.unwrap();

    let err = d.submit(id, &stale).await.unwrap_err();
    assert_eq!(
        err,
        ProtocolError::CommitmentMismatch {
            request_id: id,
            signal: "aadhaarHash"
        }
    );
    assert_eq!(
        d.ledger.get_result(id).await.unwrap(),
        VerificationOutcome {
            completed: false,
            result: false
        }
    );
}

#[tokio::test]
async fn test_proof_for_request_five_rejected_on_six() {
    let d = funded().await;
    d.enroll(subject(), years_ago(25), "Delhi").await.unwrap();
    for _ in 0..6 {
        d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();
    }

    let proof = d.prove(subject(), RequestId(5)).await.unwrap();
    let err = d.submit(RequestId(6), &proof).await.unwrap_err();
    assert_eq!(
        err,
        ProtocolError::CommitmentMismatch {
            request_id: RequestId(6),
            signal: "requestId"
        }
    );

    // The proof still settles the request it was made for.
    assert!(d.submit(RequestId(5), &proof).await.unwrap().result);
}

#[tokio::test]
async fn test_tampered_result_bit_is_invalid_proof() {
    let d = funded().await;
    d.enroll(subject(), years_ago(10), "Delhi").await.unwrap();
    let id = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();

    let mut proof = d.prove(subject(), id).await.unwrap();
    proof.public_signals[0] = zkyc_core::FieldElement::one();

    let err = d.submit(id, &proof).await.unwrap_err();
    assert_eq!(err, ProtocolError::InvalidProof { request_id: id });
    assert!(!d.ledger.get_result(id).await.unwrap().completed);
}

// =========================================================================
// Fees
// =========================================================================

#[tokio::test]
async fn test_fee_is_escrowed_then_split() {
    let d = funded().await;
    let fee = d.minimum_fee();
    let before = d.ledger.balance(&REQUESTER).await.unwrap();

    d.enroll(subject(), years_ago(40), "Tamil Nadu").await.unwrap();
    let id = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();
    assert_eq!(
        d.ledger.balance(&REQUESTER).await.unwrap(),
        before.checked_sub(fee).unwrap()
    );
    assert_eq!(d.ledger.balance(&d.config.escrow).await.unwrap(), fee);

    let proof = d.prove(subject(), id).await.unwrap();
    d.submit(id, &proof).await.unwrap();

    let reward = fee.basis_points(d.config.subject_reward_bps);
    assert_eq!(d.ledger.balance(&subject()).await.unwrap(), reward);
    assert_eq!(
        d.ledger.balance(&d.config.treasury).await.unwrap(),
        fee.checked_sub(reward).unwrap()
    );
    assert_eq!(d.ledger.balance(&d.config.escrow).await.unwrap(), Amount::ZERO);
}

#[tokio::test]
async fn test_fee_below_minimum() {
    let d = funded().await;
    d.enroll(subject(), years_ago(40), "Delhi").await.unwrap();
    let err = d
        .ledger
        .request_verification(
            REQUESTER,
            subject(),
            PredicateParams::AgeThreshold,
            Amount(d.minimum_fee().units() - 1),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InsufficientFee);
}
