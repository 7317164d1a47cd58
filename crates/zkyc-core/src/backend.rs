use async_trait::async_trait;

use crate::error::ProtocolError;
use crate::field::FieldElement;
use crate::proof::{CircuitInputs, Groth16Proof, ProverOutput, VerificationKey};
use crate::types::PredicateKind;

/// Failures of an opaque proving backend.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("constraints not satisfied: {0}")]
    Unsatisfied(String),

    #[error("missing artifact: {0}")]
    MissingArtifact(String),

    #[error("backend process failed: {0}")]
    Process(String),

    #[error("malformed backend output: {0}")]
    Malformed(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<BackendError> for ProtocolError {
    fn from(e: BackendError) -> Self {
        ProtocolError::ProverError(e.to_string())
    }
}

/// Witness generation plus proof construction for one circuit per kind.
///
/// Implementations own their proving keys. The caller supplies the complete
/// flat input mapping.
#[async_trait]
pub trait CircuitProver: Send + Sync {
    async fn prove(
        &self,
        kind: PredicateKind,
        inputs: &CircuitInputs,
    ) -> Result<ProverOutput, BackendError>;

    /// Return the unique identifier of this backend (e.g. "dev", "snarkjs").
    fn backend_id(&self) -> &str;
}

/// Algebraic proof check. Must be free of side effects so that callers can
/// retry it.
#[async_trait]
pub trait ProofVerifier: Send + Sync {
    async fn verify(
        &self,
        key: &VerificationKey,
        public_signals: &[FieldElement],
        proof: &Groth16Proof,
    ) -> Result<bool, BackendError>;

    fn backend_id(&self) -> &str;
}
