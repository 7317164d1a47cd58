//! Wire types exchanged with the opaque prover and verifier.
//!
//! The public-signal layout is a stable contract per predicate kind:
//!
//! | index | age threshold         | state equality        |
//! |-------|-----------------------|-----------------------|
//! | 0     | resultBit             | resultBit             |
//! | 1     | nullifierHash         | nullifierHash         |
//! | 2     | requestId             | requestId             |
//! | 3     | requesterIdentifier   | requesterIdentifier   |
//! | 4     | aadhaarHash           | stateCommitment       |
//! | 5     | secretHash            | secretHash            |
//!
//! `requiredState` is a private constant of the state circuit and is not
//! republished.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ProtocolError;
use crate::field::FieldElement;
use crate::types::{CircuitId, PredicateKind};

/// Number of public signals for every supported kind.
pub const PUBLIC_SIGNAL_COUNT: usize = 6;

/// A Groth16 proof in the snarkjs `proof.json` shape. Coordinates are decimal
/// strings and are never interpreted by this crate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Groth16Proof {
    pub pi_a: Vec<String>,
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default = "default_curve")]
    pub curve: String,
}

fn default_protocol() -> String {
    "groth16".into()
}

fn default_curve() -> String {
    "bn128".into()
}

/// What comes back from a prover run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProverOutput {
    pub proof: Groth16Proof,
    pub public_signals: Vec<FieldElement>,
}

/// The fixed verification key of one circuit, kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationKey {
    pub circuit: CircuitId,
    pub key: serde_json::Value,
}

impl VerificationKey {
    pub fn new(circuit: CircuitId, key: serde_json::Value) -> Self {
        Self { circuit, key }
    }

    pub fn kind(&self) -> PredicateKind {
        self.circuit.kind
    }

    /// BLAKE3 digest over the circuit id and the key's canonical JSON.
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.circuit.to_string().as_bytes());
        hasher.update(&[0u8]);
        hasher.update(self.key.to_string().as_bytes());
        *hasher.finalize().as_bytes()
    }
}

/// Flat named-signal input to the prover (snarkjs `input.json`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CircuitInputs(BTreeMap<String, FieldElement>);

impl CircuitInputs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: FieldElement) -> &mut Self {
        self.0.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<FieldElement> {
        self.0.get(name).copied()
    }

    pub fn remove(&mut self, name: &str) -> Option<FieldElement> {
        self.0.remove(name)
    }

    /// Fetch a signal that must be present.
    pub fn require(&self, name: &str) -> Result<FieldElement, ProtocolError> {
        self.get(name)
            .ok_or_else(|| ProtocolError::InvalidInput(format!("missing circuit input '{}'", name)))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Public signals decoded by position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicSignals {
    pub result: bool,
    pub nullifier_hash: FieldElement,
    pub request_id: FieldElement,
    pub requester: FieldElement,
    /// `aadhaarHash` or `stateCommitment` depending on the kind.
    pub credential_commitment: FieldElement,
    pub secret_hash: FieldElement,
}

impl PublicSignals {
    pub fn decode(kind: PredicateKind, signals: &[FieldElement]) -> Result<Self, ProtocolError> {
        if signals.len() != PUBLIC_SIGNAL_COUNT {
            return Err(ProtocolError::InvalidInput(format!(
                "{} expects {} public signals, got {}",
                kind,
                PUBLIC_SIGNAL_COUNT,
                signals.len()
            )));
        }
        let result = signals[0].as_bit().ok_or_else(|| {
            ProtocolError::InvalidInput(format!("result signal is not a bit: {}", signals[0]))
        })?;
        Ok(Self {
            result,
            nullifier_hash: signals[1],
            request_id: signals[2],
            requester: signals[3],
            credential_commitment: signals[4],
            secret_hash: signals[5],
        })
    }

    pub fn encode(&self) -> Vec<FieldElement> {
        vec![
            FieldElement::from_bool(self.result),
            self.nullifier_hash,
            self.request_id,
            self.requester,
            self.credential_commitment,
            self.secret_hash,
        ]
    }
}
