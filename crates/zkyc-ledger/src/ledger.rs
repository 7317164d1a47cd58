use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use zkyc_core::{
    AccountId, Amount, Capabilities, CircuitId, CredentialCommitments, CredentialRecord,
    FieldElement, Groth16Proof, KindCapability, PredicateKind, PredicateParams, ProofVerifier, ProtocolConfig,
    ProtocolError, RequestId, RequestStateMachine, VerificationEvent, VerificationKey,
    VerificationOutcome, VerificationRequest, VerificationState, PROTOCOL_VERSION,
    PUBLIC_SIGNAL_COUNT,
};
use zkyc_registry::CredentialRegistry;
use zkyc_settlement::{FeeSplit, PaymentRail, SettlementId, TransferLeg};

use crate::engine::{check_submission, AdmittedSubmission};
use crate::events::LedgerEvent;
use crate::nullifiers::NullifierSet;
use crate::sessions::SessionBook;
use crate::store::{LedgerStore, StoreBatch, StoreOp};

const EVENT_CAPACITY: usize = 1024;

/// External collaborators of a ledger.
pub struct LedgerComponents {
    pub verifier: Arc<dyn ProofVerifier>,
    /// One fixed verification key per compiled circuit. Requests whose
    /// circuit has no key are refused.
    pub verification_keys: Vec<VerificationKey>,
    pub rail: Arc<dyn PaymentRail>,
    pub store: Arc<dyn LedgerStore>,
}

struct LedgerState {
    registry: CredentialRegistry,
    sessions: SessionBook,
    nullifiers: NullifierSet,
}

/// The ledger of record.
///
/// Every mutation takes the state write lock for its full duration, so
/// issuance, revocation, request creation and completion are applied in a
/// single global order. Each mutation persists one store batch and moves fees
/// on the payment rail before the in-memory state changes. If the store write
/// fails the rail transfer is rolled back.
///
/// Proof verification runs outside the lock and is followed by a full
/// re-check under the write lock, so two concurrent submissions for one
/// request yield one success and one `AlreadyCompleted`.
pub struct Ledger {
    config: ProtocolConfig,
    state: RwLock<LedgerState>,
    verifier: Arc<dyn ProofVerifier>,
    keys: HashMap<CircuitId, VerificationKey>,
    rail: Arc<dyn PaymentRail>,
    store: Arc<dyn LedgerStore>,
    events: broadcast::Sender<LedgerEvent>,
}

impl Ledger {
    /// Validate the configuration and rebuild state from the store.
    pub fn open(config: ProtocolConfig, components: LedgerComponents) -> Result<Self, ProtocolError> {
        config.validate()?;
        let snapshot = components.store.load()?;

        let registry = CredentialRegistry::restore(
            config.issuer,
            snapshot.credentials,
            snapshot.revocations,
        );
        let sessions = SessionBook::restore(snapshot.requests.into_values(), snapshot.next_request_id);
        let nullifiers = NullifierSet::restore(snapshot.nullifiers);

        let keys: HashMap<CircuitId, VerificationKey> = components
            .verification_keys
            .into_iter()
            .map(|k| (k.circuit, k))
            .collect();

        tracing::info!(
            issuer = %config.issuer,
            credentials = registry.len(),
            requests = sessions.len(),
            nullifiers = nullifiers.len(),
            circuits = keys.len(),
            rail = components.rail.rail_id(),
            verifier = components.verifier.backend_id(),
            "ledger opened"
        );

        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Ok(Self {
            config,
            state: RwLock::new(LedgerState {
                registry,
                sessions,
                nullifiers,
            }),
            verifier: components.verifier,
            keys,
            rail: components.rail,
            store: components.store,
            events,
        })
    }

    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LedgerEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: LedgerEvent) {
        // No subscribers is not an error.
        let _ = self.events.send(event);
    }

    /// Persist a batch, rolling back the given rail settlements on failure.
    async fn commit_or_rollback(
        &self,
        batch: StoreBatch,
        settlements: &[SettlementId],
    ) -> Result<(), ProtocolError> {
        if let Err(e) = self.store.commit(batch) {
            for settlement_id in settlements {
                if let Err(rollback) = self.rail.rollback(*settlement_id).await {
                    tracing::error!(
                        settlement_id = %settlement_id,
                        error = %rollback,
                        "rollback after failed store commit also failed"
                    );
                }
            }
            tracing::warn!(error = %e, "store commit failed, operation rolled back");
            return Err(e.into());
        }
        Ok(())
    }

    /// Move funds for one settlement: initiate then confirm.
    async fn transfer(&self, legs: Vec<TransferLeg>, memo: String) -> Result<Option<SettlementId>, ProtocolError> {
        if legs.is_empty() {
            return Ok(None);
        }
        let settlement_id = self.rail.initiate(legs, memo).await?;
        if let Err(e) = self.rail.confirm(settlement_id).await {
            if let Err(rollback) = self.rail.rollback(settlement_id).await {
                tracing::error!(settlement_id = %settlement_id, error = %rollback, "rollback failed");
            }
            return Err(e.into());
        }
        Ok(Some(settlement_id))
    }

    // ========================================================================
    // Credential registry
    // ========================================================================

    pub async fn issue(
        &self,
        caller: &AccountId,
        subject: AccountId,
        label: &str,
        commitments: CredentialCommitments,
    ) -> Result<CredentialRecord, ProtocolError> {
        let mut state = self.state.write().await;
        let issuance = state
            .registry
            .plan_issue(caller, subject, label, commitments, Utc::now())?;

        let mut batch = StoreBatch::new();
        batch.push(StoreOp::PutCredential {
            subject,
            record: issuance.record.clone(),
        });
        self.commit_or_rollback(batch, &[]).await?;

        let record = issuance.record.clone();
        state.registry.apply_issue(issuance);
        drop(state);

        self.emit(LedgerEvent::CredentialIssued {
            subject,
            label: record.label.clone(),
        });
        Ok(record)
    }

    pub async fn revoke(&self, caller: &AccountId, subject: &AccountId) -> Result<(), ProtocolError> {
        let mut state = self.state.write().await;
        let revocation = state.registry.plan_revoke(caller, subject)?;
        if revocation.is_noop() {
            tracing::debug!(subject = %subject, "credential already revoked");
            return Ok(());
        }

        let mut batch = StoreBatch::new();
        batch
            .push(StoreOp::PutCredential {
                subject: *subject,
                record: revocation.record.clone(),
            })
            .push(StoreOp::AddRevocation(revocation.record.secret_hash));
        self.commit_or_rollback(batch, &[]).await?;

        let secret_hash = revocation.record.secret_hash;
        state.registry.apply_revoke(revocation);
        drop(state);

        self.emit(LedgerEvent::CredentialRevoked {
            subject: *subject,
            secret_hash,
        });
        Ok(())
    }

    pub async fn has_valid_credential(&self, subject: &AccountId) -> bool {
        self.state.read().await.registry.has_valid_credential(subject)
    }

    pub async fn get_commitments(
        &self,
        subject: &AccountId,
    ) -> Result<CredentialCommitments, ProtocolError> {
        self.state.read().await.registry.get_commitments(subject)
    }

    pub async fn get_record(&self, subject: &AccountId) -> Result<CredentialRecord, ProtocolError> {
        self.state.read().await.registry.get_record(subject).cloned()
    }

    pub async fn is_secret_hash_revoked(&self, secret_hash: &FieldElement) -> bool {
        self.state
            .read()
            .await
            .registry
            .is_secret_hash_revoked(secret_hash)
    }

    pub fn issuer(&self) -> AccountId {
        self.config.issuer
    }

    // ========================================================================
    // Verification sessions
    // ========================================================================

    /// Create a funded verification request. The fee moves from the
    /// requester to escrow on the payment rail.
    pub async fn request_verification(
        &self,
        requester: AccountId,
        subject: AccountId,
        params: PredicateParams,
        fee: Amount,
    ) -> Result<RequestId, ProtocolError> {
        let kind = params.kind();
        let circuit = params.circuit();
        if !self.keys.contains_key(&circuit) {
            return Err(ProtocolError::InvalidInput(format!(
                "circuit {} is not supported by this deployment",
                circuit
            )));
        }
        let minimum = self.config.minimum_fee(kind);
        if fee < minimum {
            return Err(ProtocolError::InsufficientFee { kind, fee, minimum });
        }

        let mut state = self.state.write().await;
        if !state.registry.has_valid_credential(&subject) {
            return Err(ProtocolError::NoValidCredential { subject });
        }

        let id = state.sessions.next_id();
        let escrow_leg = TransferLeg::new(requester, self.config.escrow, fee);
        let settlement = self
            .transfer(vec![escrow_leg], format!("request-{}/escrow", id))
            .await?;

        let request = VerificationRequest {
            id,
            kind,
            requester,
            subject,
            params,
            fee,
            state: VerificationState::Pending,
            result: false,
            nullifier_hash: None,
            created_at: Utc::now(),
            completed_at: None,
        };

        let mut batch = StoreBatch::new();
        batch
            .push(StoreOp::PutRequest(request.clone()))
            .push(StoreOp::SetNextRequestId(id.next()));
        self.commit_or_rollback(batch, settlement.as_slice()).await?;

        state.sessions.apply_created(request);
        drop(state);

        tracing::info!(
            request_id = %id,
            kind = %kind,
            requester = %requester,
            subject = %subject,
            fee = %fee,
            "verification requested"
        );
        self.emit(LedgerEvent::VerificationRequested {
            request_id: id,
            kind,
            requester,
            subject,
            fee,
        });
        Ok(id)
    }

    pub async fn get_pending_requests(&self, subject: &AccountId) -> Vec<RequestId> {
        self.state.read().await.sessions.pending_for(subject)
    }

    pub async fn get_result(&self, request_id: RequestId) -> Result<VerificationOutcome, ProtocolError> {
        self.state.read().await.sessions.outcome(request_id)
    }

    pub async fn get_request(&self, request_id: RequestId) -> Result<VerificationRequest, ProtocolError> {
        self.state.read().await.sessions.get(request_id).cloned()
    }

    pub async fn is_nullifier_used(&self, nullifier: &FieldElement) -> bool {
        self.state.read().await.nullifiers.contains(nullifier)
    }

    /// Versioned description of supported kinds and their minimum fees.
    pub fn capabilities(&self) -> Capabilities {
        let kinds = PredicateKind::ALL
            .iter()
            .filter(|kind| self.keys.keys().any(|c| c.kind == **kind))
            .map(|kind| {
                let mut required_states: Vec<u32> = self
                    .keys
                    .keys()
                    .filter(|c| c.kind == *kind)
                    .filter_map(|c| c.required_state)
                    .collect();
                required_states.sort_unstable();
                KindCapability {
                    kind: *kind,
                    minimum_fee: self.config.minimum_fee(*kind),
                    public_signals: PUBLIC_SIGNAL_COUNT,
                    required_states,
                }
            })
            .collect();
        Capabilities {
            protocol_version: PROTOCOL_VERSION.to_string(),
            issuer: self.config.issuer,
            subject_reward_bps: self.config.subject_reward_bps,
            kinds,
        }
    }

    // ========================================================================
    // Proof settlement
    // ========================================================================

    /// Check, verify and settle a proof for a pending request.
    pub async fn complete_verification(
        &self,
        request_id: RequestId,
        proof: &Groth16Proof,
        public_signals: &[FieldElement],
    ) -> Result<VerificationOutcome, ProtocolError> {
        let result = self.settle(request_id, proof, public_signals).await;
        if let Err(e) = &result {
            tracing::debug!(request_id = %request_id, kind = %e.kind(), error = %e, "submission rejected");
        }
        result
    }

    async fn settle(
        &self,
        request_id: RequestId,
        proof: &Groth16Proof,
        public_signals: &[FieldElement],
    ) -> Result<VerificationOutcome, ProtocolError> {
        // The request's own parameters pick the key, never the submission.
        let circuit = {
            let state = self.state.read().await;
            Self::admit(&state, request_id, public_signals)?.request.params.circuit()
        };

        let key = self.keys.get(&circuit).ok_or_else(|| ProtocolError::VerifierUnavailable {
            request_id,
            reason: format!("no verification key for {}", circuit),
        })?;
        let valid = self
            .verifier
            .verify(key, public_signals, proof)
            .await
            .map_err(|e| ProtocolError::VerifierUnavailable {
                request_id,
                reason: e.to_string(),
            })?;
        if !valid {
            return Err(ProtocolError::InvalidProof { request_id });
        }

        let mut state = self.state.write().await;
        let AdmittedSubmission { request, signals } = Self::admit(&state, request_id, public_signals)?;

        let mut completed = request;
        completed.state =
            RequestStateMachine::transition(completed.state, VerificationEvent::ProofAccepted)
                .map_err(|_| ProtocolError::AlreadyCompleted { request_id })?;
        completed.result = signals.result;
        completed.nullifier_hash = Some(signals.nullifier_hash);
        completed.completed_at = Some(Utc::now());

        let split = FeeSplit::compute(completed.fee, self.config.subject_reward_bps);
        let settlement = self
            .transfer(
                split.payout_legs(self.config.escrow, completed.subject, self.config.treasury),
                format!("request-{}/payout", request_id),
            )
            .await?;

        let mut batch = StoreBatch::new();
        batch
            .push(StoreOp::AddNullifier {
                nullifier: signals.nullifier_hash,
                request_id,
            })
            .push(StoreOp::PutRequest(completed.clone()));
        self.commit_or_rollback(batch, settlement.as_slice()).await?;

        state.nullifiers.insert(signals.nullifier_hash, request_id);
        state.sessions.apply_completed(completed);
        drop(state);

        tracing::info!(
            request_id = %request_id,
            result = signals.result,
            subject_reward = %split.subject_reward,
            treasury_share = %split.treasury_share,
            "verification completed"
        );
        self.emit(LedgerEvent::VerificationCompleted {
            request_id,
            result: signals.result,
        });
        Ok(VerificationOutcome {
            completed: true,
            result: signals.result,
        })
    }

    fn admit(
        state: &LedgerState,
        request_id: RequestId,
        public_signals: &[FieldElement],
    ) -> Result<AdmittedSubmission, ProtocolError> {
        check_submission(
            &state.registry,
            &state.sessions,
            &state.nullifiers,
            request_id,
            public_signals,
        )
    }

    // ========================================================================
    // Payments
    // ========================================================================

    pub async fn balance(&self, account: &AccountId) -> Result<Amount, ProtocolError> {
        Ok(self.rail.balance(account).await?)
    }

    pub async fn deposit(&self, account: &AccountId, amount: Amount) -> Result<Amount, ProtocolError> {
        Ok(self.rail.deposit(account, amount).await?)
    }
}
