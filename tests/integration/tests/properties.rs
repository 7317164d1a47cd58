//! Integration test: nullifier single use, revocation finality, concurrency
//! and durability.

use std::sync::Arc;
use zkyc_core::{
    AccountId, Amount, ErrorKind, PredicateKind, PredicateParams, ProtocolError,
};
use zkyc_integration_tests::{years_ago, Deployment, REQUESTER};
use zkyc_ledger::LedgerEvent;

fn subject() -> AccountId {
    AccountId::from_low_u64(200)
}

async fn enrolled() -> Deployment {
    let d = Deployment::new().unwrap();
    d.fund(REQUESTER, Amount(100 * d.minimum_fee().units()))
        .await
        .unwrap();
    d.enroll(subject(), years_ago(33), "Karnataka").await.unwrap();
    d
}

// =========================================================================
// Nullifiers
// =========================================================================

#[tokio::test]
async fn test_spent_nullifier_cannot_settle_another_request() {
    let d = enrolled().await;
    let first = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();
    let second = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();

    let spent = d.prove(subject(), first).await.unwrap();
    d.submit(first, &spent).await.unwrap();
    assert!(d.ledger.is_nullifier_used(&spent.public_signals[1]).await);

    let mut replay = d.prove(subject(), second).await.unwrap();
    replay.public_signals[1] = spent.public_signals[1];
    let err = d.submit(second, &replay).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NullifierReused);
    assert!(!d.ledger.get_result(second).await.unwrap().completed);
}

#[tokio::test]
async fn test_nullifiers_are_distinct_per_request() {
    let d = enrolled().await;
    let a = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();
    let b = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();
    let pa = d.prove(subject(), a).await.unwrap();
    let pb = d.prove(subject(), b).await.unwrap();
    assert_ne!(pa.public_signals[1], pb.public_signals[1]);

    d.submit(a, &pa).await.unwrap();
    d.submit(b, &pb).await.unwrap();
}

// =========================================================================
// Revocation finality
// =========================================================================

#[tokio::test]
async fn test_revoked_secret_stays_revoked_after_reissue() {
    let d = enrolled().await;
    let prepared = d.ledger.get_commitments(&subject()).await.unwrap();
    d.ledger.revoke(&d.config.issuer, &subject()).await.unwrap();

    // Same commitments reissued to the same subject and to a new one.
    let other = AccountId::from_low_u64(201);
    d.ledger
        .issue(&d.config.issuer, subject(), "reissued", prepared)
        .await
        .unwrap();
    d.ledger
        .issue(&d.config.issuer, other, "moved", prepared)
        .await
        .unwrap();

    assert!(d.ledger.is_secret_hash_revoked(&prepared.secret_hash).await);
    assert!(!d.ledger.has_valid_credential(&subject()).await);
    assert!(!d.ledger.has_valid_credential(&other).await);
    for who in [subject(), other] {
        let err = d
            .request(who, PredicateParams::AgeThreshold)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NoValidCredential);
    }
}

#[tokio::test]
async fn test_fresh_secret_restores_validity() {
    let d = enrolled().await;
    d.ledger.revoke(&d.config.issuer, &subject()).await.unwrap();
    d.enroll(subject(), years_ago(33), "Karnataka").await.unwrap();

    assert!(d.ledger.has_valid_credential(&subject()).await);
    let id = d.request(subject(), PredicateParams::StateEquality { required_state: 29 })
        .await
        .unwrap();
    let proof = d.prove(subject(), id).await.unwrap();
    assert!(d.submit(id, &proof).await.unwrap().result);
}

// =========================================================================
// Concurrency
// =========================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_submissions_have_one_winner() {
    let d = Arc::new(enrolled().await);
    let id = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();
    let proof = d.prove(subject(), id).await.unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let d = d.clone();
        let proof = proof.clone();
        handles.push(tokio::spawn(async move { d.submit(id, &proof).await }));
    }

    let mut wins = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(outcome) => {
                assert!(outcome.result);
                wins += 1;
            }
            Err(e) => assert_eq!(e, ProtocolError::AlreadyCompleted { request_id: id }),
        }
    }
    assert_eq!(wins, 1);

    // Paid out exactly once.
    let fee = d.minimum_fee();
    assert_eq!(
        d.ledger.balance(&subject()).await.unwrap(),
        fee.basis_points(d.config.subject_reward_bps)
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_requests_get_distinct_ids() {
    let d = Arc::new(enrolled().await);
    let mut handles = Vec::new();
    for _ in 0..10 {
        let d = d.clone();
        handles.push(tokio::spawn(async move {
            d.request(subject(), PredicateParams::AgeThreshold).await
        }));
    }
    let mut ids = Vec::new();
    for handle in handles {
        ids.push(handle.await.unwrap().unwrap());
    }
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
    assert_eq!(d.ledger.get_pending_requests(&subject()).await.len(), 10);
}

// =========================================================================
// Durability and events
// =========================================================================

#[tokio::test]
async fn test_state_survives_reopen() {
    let d = enrolled().await;
    let done = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();
    let open = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();
    let proof = d.prove(subject(), done).await.unwrap();
    d.submit(done, &proof).await.unwrap();

    let reopened =
        Deployment::with_parts(d.config.clone(), d.store.clone(), d.rail.clone()).unwrap();
    assert!(reopened.ledger.get_result(done).await.unwrap().completed);
    assert!(reopened.ledger.is_nullifier_used(&proof.public_signals[1]).await);
    assert_eq!(reopened.ledger.get_pending_requests(&subject()).await, vec![open]);
    assert!(reopened.ledger.has_valid_credential(&subject()).await);

    let next = reopened
        .request(subject(), PredicateParams::AgeThreshold)
        .await
        .unwrap();
    assert!(next > open);
}

#[tokio::test]
async fn test_events_follow_the_flow() {
    let d = Deployment::new().unwrap();
    d.fund(REQUESTER, d.minimum_fee()).await.unwrap();
    let mut events = d.ledger.subscribe();

    d.enroll(subject(), years_ago(20), "Delhi").await.unwrap();
    let id = d.request(subject(), PredicateParams::AgeThreshold).await.unwrap();
    let proof = d.prove(subject(), id).await.unwrap();
    d.submit(id, &proof).await.unwrap();

    assert!(matches!(
        events.recv().await.unwrap(),
        LedgerEvent::CredentialIssued { .. }
    ));
    match events.recv().await.unwrap() {
        LedgerEvent::VerificationRequested { request_id, kind, .. } => {
            assert_eq!(request_id, id);
            assert_eq!(kind, PredicateKind::AgeThreshold);
        }
        other => panic!("unexpected event {:?}", other),
    }
    assert_eq!(
        events.recv().await.unwrap(),
        LedgerEvent::VerificationCompleted {
            request_id: id,
            result: true
        }
    );
}

#[tokio::test]
async fn test_capabilities_advertise_both_kinds() {
    let d = Deployment::new().unwrap();
    let caps = d.ledger.capabilities();
    let kinds: Vec<_> = caps.kinds.iter().map(|k| k.kind).collect();
    assert_eq!(kinds, PredicateKind::ALL.to_vec());
    assert!(caps.kinds.iter().all(|k| k.public_signals == 6));
    assert_eq!(caps.kinds[1].required_states.len(), 35);
}

#[tokio::test]
async fn test_repeated_revocation_is_reported_once() {
    let d = enrolled().await;
    let mut events = d.ledger.subscribe();
    for _ in 0..3 {
        d.ledger.revoke(&d.config.issuer, &subject()).await.unwrap();
    }
    let mut revoked = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, LedgerEvent::CredentialRevoked { .. }) {
            revoked += 1;
        }
    }
    assert_eq!(revoked, 1);
}
