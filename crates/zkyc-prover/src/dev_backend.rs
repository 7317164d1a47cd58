//! In-process development backend.
//!
//! Evaluates each circuit's relation natively and produces a keyed BLAKE3 tag
//! over the public signals instead of a pairing-based proof. A tag verifies
//! only against the same verification key and the exact signals it was made
//! for, which is enough to exercise the whole submission path without the
//! circom toolchain. It provides no zero-knowledge or soundness against a
//! party that knows the key.

use async_trait::async_trait;
use std::sync::Arc;

use zkyc_core::{
    BackendError, CircuitId, CircuitInputs, CircuitProver, FieldElement, Groth16Proof,
    PredicateKind, ProofVerifier, ProverOutput, PublicSignals, VerificationKey,
};
use zkyc_crypto::FieldHasher;

use crate::age::evaluate_age;
use crate::assembler::circuit_of;
use crate::state::evaluate_state;

pub const DEV_PROTOCOL: &str = "zkyc-dev";

pub struct DevelopmentBackend {
    hasher: Arc<dyn FieldHasher>,
}

impl DevelopmentBackend {
    pub fn new(hasher: Arc<dyn FieldHasher>) -> Self {
        Self { hasher }
    }

    /// Development keys are derived from the circuit id, so a state-equality
    /// key only accepts proofs made for its own required state.
    pub fn verification_key(&self, circuit: CircuitId) -> VerificationKey {
        let mut key = serde_json::json!({
            "protocol": DEV_PROTOCOL,
            "curve": "bn128",
            "circuit": circuit.kind.circuit_name(),
            "nPublic": zkyc_core::PUBLIC_SIGNAL_COUNT,
        });
        if let Some(state) = circuit.required_state {
            key["requiredState"] = serde_json::json!(state);
        }
        VerificationKey::new(circuit, key)
    }

    /// The age key plus one state-equality key per listed state code.
    pub fn verification_keys(&self, required_states: &[u32]) -> Vec<VerificationKey> {
        std::iter::once(CircuitId::age_threshold())
            .chain(required_states.iter().map(|&s| CircuitId::state_equality(s)))
            .map(|circuit| self.verification_key(circuit))
            .collect()
    }

    fn tag(key: &VerificationKey, public_signals: &[FieldElement]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new_keyed(&key.digest());
        for signal in public_signals {
            hasher.update(&signal.to_le_bytes());
        }
        *hasher.finalize().as_bytes()
    }

    fn tag_coordinates(tag: &[u8; 32]) -> [String; 2] {
        let mut lo = [0u8; 16];
        let mut hi = [0u8; 16];
        lo.copy_from_slice(&tag[..16]);
        hi.copy_from_slice(&tag[16..]);
        [
            u128::from_le_bytes(lo).to_string(),
            u128::from_le_bytes(hi).to_string(),
        ]
    }

    fn signal(inputs: &CircuitInputs, name: &str) -> Result<FieldElement, BackendError> {
        inputs
            .get(name)
            .ok_or_else(|| BackendError::Unsatisfied(format!("missing signal {}", name)))
    }
}

#[async_trait]
impl CircuitProver for DevelopmentBackend {
    async fn prove(
        &self,
        kind: PredicateKind,
        inputs: &CircuitInputs,
    ) -> Result<ProverOutput, BackendError> {
        let result = match kind {
            PredicateKind::AgeThreshold => evaluate_age(self.hasher.as_ref(), inputs)?,
            PredicateKind::StateEquality => evaluate_state(self.hasher.as_ref(), inputs)?,
        };

        let public_signals = PublicSignals {
            result,
            nullifier_hash: Self::signal(inputs, "nullifierHash")?,
            request_id: Self::signal(inputs, "requestIdentifier")?,
            requester: Self::signal(inputs, "verifierIdentifier")?,
            credential_commitment: Self::signal(inputs, kind.commitment_signal())?,
            secret_hash: Self::signal(inputs, "secretHash")?,
        }
        .encode();

        let circuit = circuit_of(kind, inputs)?;
        let key = self.verification_key(circuit);
        let [a0, a1] = Self::tag_coordinates(&Self::tag(&key, &public_signals));

        tracing::debug!(circuit = %circuit, result, "development proof generated");

        Ok(ProverOutput {
            proof: Groth16Proof {
                pi_a: vec![a0, a1, "1".into()],
                pi_b: vec![
                    vec!["0".into(), "0".into()],
                    vec!["0".into(), "0".into()],
                    vec!["1".into(), "0".into()],
                ],
                pi_c: vec!["0".into(), "0".into(), "1".into()],
                protocol: DEV_PROTOCOL.into(),
                curve: "bn128".into(),
            },
            public_signals,
        })
    }

    fn backend_id(&self) -> &str {
        "dev"
    }
}

#[async_trait]
impl ProofVerifier for DevelopmentBackend {
    async fn verify(
        &self,
        key: &VerificationKey,
        public_signals: &[FieldElement],
        proof: &Groth16Proof,
    ) -> Result<bool, BackendError> {
        if key.key.get("protocol").and_then(|p| p.as_str()) != Some(DEV_PROTOCOL) {
            return Err(BackendError::Malformed(format!(
                "verification key for {} is not a development key",
                key.circuit
            )));
        }
        if proof.protocol != DEV_PROTOCOL || proof.pi_a.len() != 3 {
            return Ok(false);
        }
        let expected = Self::tag_coordinates(&Self::tag(key, public_signals));
        Ok(proof.pi_a[0] == expected[0] && proof.pi_a[1] == expected[1])
    }

    fn backend_id(&self) -> &str {
        "dev"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::age::age_inputs;
    use crate::state::state_inputs;
    use chrono::NaiveDate;
    use zkyc_core::{AccountId, RequestId};
    use zkyc_crypto::{CredentialOpening, PoseidonHasher};

    fn backend() -> DevelopmentBackend {
        DevelopmentBackend::new(Arc::new(PoseidonHasher))
    }

    fn inputs() -> CircuitInputs {
        let opening = CredentialOpening {
            aadhaar_number: FieldElement::from_u64(123_456_789_012),
            birth_date: NaiveDate::from_ymd_opt(1990, 6, 1).unwrap(),
            salt: FieldElement::from_u64(11),
            secret: FieldElement::from_u64(12),
            state_code: 29,
            state_salt: FieldElement::from_u64(13),
        };
        age_inputs(
            &PoseidonHasher,
            &opening,
            RequestId(4),
            &AccountId::from_low_u64(50),
            NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
        )
    }

    #[tokio::test]
    async fn test_prove_then_verify() {
        let backend = backend();
        let out = backend.prove(PredicateKind::AgeThreshold, &inputs()).await.unwrap();
        assert_eq!(out.public_signals.len(), 6);
        assert_eq!(out.public_signals[0], FieldElement::one());

        let key = backend.verification_key(CircuitId::age_threshold());
        assert!(backend.verify(&key, &out.public_signals, &out.proof).await.unwrap());
    }

    #[tokio::test]
    async fn test_tampered_signals_fail() {
        let backend = backend();
        let out = backend.prove(PredicateKind::AgeThreshold, &inputs()).await.unwrap();
        let key = backend.verification_key(CircuitId::age_threshold());

        let mut forged = out.public_signals.clone();
        forged[2] = RequestId(5).to_field();
        assert!(!backend.verify(&key, &forged, &out.proof).await.unwrap());
    }

    #[tokio::test]
    async fn test_wrong_kind_key_fails() {
        let backend = backend();
        let out = backend.prove(PredicateKind::AgeThreshold, &inputs()).await.unwrap();
        let key = backend.verification_key(CircuitId::state_equality(29));
        assert!(!backend.verify(&key, &out.public_signals, &out.proof).await.unwrap());
    }

    #[tokio::test]
    async fn test_state_proof_only_verifies_for_its_state() {
        let backend = backend();
        let opening = CredentialOpening {
            aadhaar_number: FieldElement::from_u64(123_456_789_012),
            birth_date: NaiveDate::from_ymd_opt(1990, 6, 1).unwrap(),
            salt: FieldElement::from_u64(11),
            secret: FieldElement::from_u64(12),
            state_code: 7,
            state_salt: FieldElement::from_u64(13),
        };
        // A Delhi holder answers "is the state Delhi?" truthfully.
        let inputs = state_inputs(
            &PoseidonHasher,
            &opening,
            RequestId(4),
            &AccountId::from_low_u64(50),
            7,
        );
        let out = backend.prove(PredicateKind::StateEquality, &inputs).await.unwrap();
        assert_eq!(out.public_signals[0], FieldElement::one());

        let delhi = backend.verification_key(CircuitId::state_equality(7));
        let maharashtra = backend.verification_key(CircuitId::state_equality(27));
        assert!(backend.verify(&delhi, &out.public_signals, &out.proof).await.unwrap());
        assert!(!backend.verify(&maharashtra, &out.public_signals, &out.proof).await.unwrap());
    }

    #[test]
    fn test_verification_keys_per_state() {
        let keys = backend().verification_keys(&[7, 27]);
        let circuits: Vec<_> = keys.iter().map(|k| k.circuit).collect();
        assert_eq!(
            circuits,
            vec![
                CircuitId::age_threshold(),
                CircuitId::state_equality(7),
                CircuitId::state_equality(27)
            ]
        );
        assert_eq!(keys[2].key["requiredState"], 27);
        assert_ne!(keys[1].digest(), keys[2].digest());
    }

    #[tokio::test]
    async fn test_foreign_key_is_malformed() {
        let backend = backend();
        let out = backend.prove(PredicateKind::AgeThreshold, &inputs()).await.unwrap();
        let key = VerificationKey::new(
            CircuitId::age_threshold(),
            serde_json::json!({"protocol": "groth16"}),
        );
        assert!(matches!(
            backend.verify(&key, &out.public_signals, &out.proof).await,
            Err(BackendError::Malformed(_))
        ));
    }

    #[tokio::test]
    async fn test_unsatisfied_inputs() {
        let mut forged = inputs();
        forged.set("secret", FieldElement::from_u64(99));
        assert!(matches!(
            backend().prove(PredicateKind::AgeThreshold, &forged).await,
            Err(BackendError::Unsatisfied(_))
        ));
    }
}
