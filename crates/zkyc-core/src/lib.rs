//! zkyc Core — shared types, error kinds, request lifecycle, protocol
//! configuration and the opaque prover/verifier seams.

pub mod backend;
pub mod config;
pub mod error;
pub mod field;
pub mod proof;
pub mod request_state;
pub mod types;

pub use backend::{BackendError, CircuitProver, ProofVerifier};
pub use config::{PredicatePolicy, ProtocolConfig, DEFAULT_MINIMUM_FEE, PROTOCOL_VERSION};
pub use error::{ErrorKind, ProtocolError};
pub use field::{FieldElement, FieldError};
pub use proof::{
    CircuitInputs, Groth16Proof, ProverOutput, PublicSignals, VerificationKey,
    PUBLIC_SIGNAL_COUNT,
};
pub use request_state::{RequestStateMachine, VerificationEvent, VerificationState};
pub use types::{
    AccountId, Amount, Capabilities, CircuitId, CredentialCommitments, CredentialRecord,
    KindCapability, PredicateKind, PredicateParams, RequestId, VerificationOutcome,
    VerificationRequest, AGE_THRESHOLD,
};
