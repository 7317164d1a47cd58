//! Witness assembly: turns a holder's private opening plus a pending request
//! into circuit inputs, runs the prover, and checks that what came back is
//! bound to the request before anything is submitted.

use chrono::{NaiveDate, Utc};
use std::sync::Arc;

use zkyc_core::{
    AccountId, BackendError, CircuitId, CircuitInputs, CircuitProver, PredicateKind,
    PredicateParams, ProtocolError, ProverOutput, PublicSignals, RequestId, VerificationRequest,
    PUBLIC_SIGNAL_COUNT,
};
use zkyc_crypto::{CredentialOpening, FieldHasher};

use crate::age::{age_inputs, AGE_INPUTS};
use crate::state::{required_state, state_inputs, STATE_INPUTS};

/// The public half of a request, as seen by the holder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProofRequest {
    pub request_id: RequestId,
    pub requester: AccountId,
    pub params: PredicateParams,
}

impl ProofRequest {
    pub fn kind(&self) -> PredicateKind {
        self.params.kind()
    }
}

impl From<&VerificationRequest> for ProofRequest {
    fn from(request: &VerificationRequest) -> Self {
        Self {
            request_id: request.id,
            requester: request.requester,
            params: request.params.clone(),
        }
    }
}

/// Input names each circuit requires.
pub fn required_inputs(kind: PredicateKind) -> &'static [&'static str] {
    match kind {
        PredicateKind::AgeThreshold => AGE_INPUTS,
        PredicateKind::StateEquality => STATE_INPUTS,
    }
}

/// The compiled circuit that proves a set of inputs of the given kind.
pub fn circuit_of(kind: PredicateKind, inputs: &CircuitInputs) -> Result<CircuitId, BackendError> {
    Ok(match kind {
        PredicateKind::AgeThreshold => CircuitId::age_threshold(),
        PredicateKind::StateEquality => CircuitId::state_equality(required_state(inputs)?),
    })
}

/// Reject input sets that are missing a signal the circuit reads.
pub fn validate_inputs(kind: PredicateKind, inputs: &CircuitInputs) -> Result<(), ProtocolError> {
    for name in required_inputs(kind) {
        inputs.require(name)?;
    }
    Ok(())
}

pub struct WitnessAssembler {
    hasher: Arc<dyn FieldHasher>,
    prover: Arc<dyn CircuitProver>,
}

impl WitnessAssembler {
    pub fn new(hasher: Arc<dyn FieldHasher>, prover: Arc<dyn CircuitProver>) -> Self {
        Self { hasher, prover }
    }

    pub fn build_inputs(
        &self,
        opening: &CredentialOpening,
        request: &ProofRequest,
        today: NaiveDate,
    ) -> CircuitInputs {
        match request.params {
            PredicateParams::AgeThreshold => age_inputs(
                self.hasher.as_ref(),
                opening,
                request.request_id,
                &request.requester,
                today,
            ),
            PredicateParams::StateEquality { required_state } => state_inputs(
                self.hasher.as_ref(),
                opening,
                request.request_id,
                &request.requester,
                required_state,
            ),
        }
    }

    /// Assemble inputs for `request` and run the prover, dating the age
    /// check with the current UTC day.
    pub async fn prove_now(
        &self,
        opening: &CredentialOpening,
        request: &ProofRequest,
    ) -> Result<ProverOutput, ProtocolError> {
        self.prove(opening, request, Utc::now().date_naive()).await
    }

    pub async fn prove(
        &self,
        opening: &CredentialOpening,
        request: &ProofRequest,
        today: NaiveDate,
    ) -> Result<ProverOutput, ProtocolError> {
        let inputs = self.build_inputs(opening, request, today);
        tracing::info!(
            request_id = %request.request_id,
            kind = %request.kind(),
            backend = self.prover.backend_id(),
            "Assembling proof"
        );
        self.prove_inputs(request.kind(), &inputs).await
    }

    /// Run the prover over a caller-built input set.
    pub async fn prove_inputs(
        &self,
        kind: PredicateKind,
        inputs: &CircuitInputs,
    ) -> Result<ProverOutput, ProtocolError> {
        validate_inputs(kind, inputs)?;
        let output = self.prover.prove(kind, inputs).await?;
        check_output(kind, inputs, &output)?;
        Ok(output)
    }
}

/// The prover's public signals must echo the inputs they were built from.
pub fn check_output(
    kind: PredicateKind,
    inputs: &CircuitInputs,
    output: &ProverOutput,
) -> Result<(), ProtocolError> {
    if output.public_signals.len() != PUBLIC_SIGNAL_COUNT {
        return Err(ProtocolError::ProverError(format!(
            "expected {} public signals, got {}",
            PUBLIC_SIGNAL_COUNT,
            output.public_signals.len()
        )));
    }
    let signals = PublicSignals::decode(kind, &output.public_signals)
        .map_err(|e| ProtocolError::ProverError(e.to_string()))?;

    let expected = [
        ("nullifierHash", signals.nullifier_hash),
        ("requestIdentifier", signals.request_id),
        ("verifierIdentifier", signals.requester),
        (kind.commitment_signal(), signals.credential_commitment),
        ("secretHash", signals.secret_hash),
    ];
    for (name, published) in expected {
        if inputs.require(name)? != published {
            return Err(ProtocolError::ProverError(format!(
                "public signal {} does not match its input",
                name
            )));
        }
    }
    Ok(())
}
