//! Shared deployment harness for the end-to-end scenarios.
//!
//! Wires a ledger over the in-memory store and rail with the development
//! backend, plus an issuer, a subject wallet and a witness assembler that
//! share one hasher.

use chrono::{Datelike, NaiveDate, Utc};
use std::sync::Arc;

use zkyc_core::{
    AccountId, Amount, ProtocolConfig, ProtocolError, ProverOutput, PredicateParams, RequestId,
};
use zkyc_crypto::{FieldHasher, PoseidonHasher};
use zkyc_ledger::{Ledger, LedgerComponents, LedgerStore, MemoryStore};
use zkyc_prover::{DevelopmentBackend, ProofRequest, WitnessAssembler};
use zkyc_registry::{state_codes, CredentialIssuer, PreparedCredential, SubjectWallet};
use zkyc_settlement::InternalRail;

pub const REQUESTER: AccountId = AccountId([
    0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0x50,
]);

pub struct Deployment {
    pub config: ProtocolConfig,
    pub ledger: Arc<Ledger>,
    pub hasher: Arc<dyn FieldHasher>,
    pub backend: Arc<DevelopmentBackend>,
    pub assembler: WitnessAssembler,
    pub rail: Arc<InternalRail>,
    pub store: Arc<MemoryStore>,
    pub issuer: CredentialIssuer,
    pub wallet: SubjectWallet,
}

impl Deployment {
    pub fn new() -> Result<Self, ProtocolError> {
        Self::with_parts(
            ProtocolConfig::default(),
            Arc::new(MemoryStore::new()),
            Arc::new(InternalRail::new(true)),
        )
    }

    /// Build a deployment over an existing store and rail, as after a restart.
    pub fn with_parts(
        config: ProtocolConfig,
        store: Arc<MemoryStore>,
        rail: Arc<InternalRail>,
    ) -> Result<Self, ProtocolError> {
        let hasher: Arc<dyn FieldHasher> = Arc::new(PoseidonHasher);
        let backend = Arc::new(DevelopmentBackend::new(hasher.clone()));
        let ledger = Ledger::open(
            config.clone(),
            LedgerComponents {
                verifier: backend.clone(),
                verification_keys: backend.verification_keys(&state_codes()),
                rail: rail.clone(),
                store: store.clone() as Arc<dyn LedgerStore>,
            },
        )?;
        Ok(Self {
            issuer: CredentialIssuer::new(config.issuer, hasher.clone()),
            assembler: WitnessAssembler::new(hasher.clone(), backend.clone()),
            config,
            ledger: Arc::new(ledger),
            hasher,
            backend,
            rail,
            store,
            wallet: SubjectWallet::new(),
        })
    }

    pub fn minimum_fee(&self) -> Amount {
        self.config.minimum_fee(zkyc_core::PredicateKind::AgeThreshold)
    }

    /// Prepare a credential, register its commitments and keep the opening.
    pub async fn enroll(
        &self,
        subject: AccountId,
        birth_date: NaiveDate,
        state: &str,
    ) -> Result<PreparedCredential, ProtocolError> {
        let prepared = self.issuer.prepare(
            &mut rand::rngs::OsRng,
            subject,
            "aadhaar",
            "123456789012",
            &birth_date.format("%Y-%m-%d").to_string(),
            state,
        )?;
        self.ledger
            .issue(&self.config.issuer, subject, &prepared.label, prepared.commitments)
            .await?;
        self.wallet.store(self.hasher.as_ref(), prepared.clone())?;
        Ok(prepared)
    }

    pub async fn fund(&self, account: AccountId, amount: Amount) -> Result<Amount, ProtocolError> {
        self.ledger.deposit(&account, amount).await
    }

    /// Open a request from [`REQUESTER`] at the minimum fee.
    pub async fn request(
        &self,
        subject: AccountId,
        params: PredicateParams,
    ) -> Result<RequestId, ProtocolError> {
        self.ledger
            .request_verification(REQUESTER, subject, params, self.minimum_fee())
            .await
    }

    /// Assemble a proof for `request_id` from the subject's wallet entry.
    pub async fn prove(
        &self,
        subject: AccountId,
        request_id: RequestId,
    ) -> Result<ProverOutput, ProtocolError> {
        let request = self.ledger.get_request(request_id).await?;
        self.prove_with(subject, &ProofRequest::from(&request)).await
    }

    /// Assemble a proof for an arbitrary view of a request, which need not
    /// match what the ledger recorded.
    pub async fn prove_with(
        &self,
        subject: AccountId,
        request: &ProofRequest,
    ) -> Result<ProverOutput, ProtocolError> {
        let entry = self
            .wallet
            .get(&subject)
            .ok_or_else(|| ProtocolError::credential_not_found(&subject))?;
        self.assembler.prove_now(&entry.opening, request).await
    }

    pub async fn submit(
        &self,
        request_id: RequestId,
        output: &ProverOutput,
    ) -> Result<zkyc_core::VerificationOutcome, ProtocolError> {
        self.ledger
            .complete_verification(request_id, &output.proof, &output.public_signals)
            .await
    }
}

/// The date `years` years before today, clamped to the 28th when today's
/// day does not exist in the target year.
pub fn years_ago(years: i32) -> NaiveDate {
    let today = Utc::now().date_naive();
    let year = today.year() - years;
    today
        .with_year(year)
        .or_else(|| today.with_day(28).and_then(|d| d.with_year(year)))
        .unwrap_or(today)
}
