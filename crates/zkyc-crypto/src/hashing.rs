//! Field-element hash primitives.
//!
//! Commitments are only meaningful if the hasher used here is the same one the
//! prover uses to check membership inside the circuit. The hasher is therefore
//! injected everywhere instead of being a free function.
//!
//! ## Poseidon parameters (BN254 scalar field)
//! - Width: 3 (rate=2, capacity=1)
//! - Full rounds: 8
//! - Partial rounds: 57
//! - S-box: x^5
//! - Round constants: Grain LFSR (arkworks standard)

use ark_bn254::Fr;
use ark_crypto_primitives::sponge::{
    poseidon::{find_poseidon_ark_and_mds, PoseidonConfig, PoseidonSponge},
    CryptographicSponge,
};
use std::sync::OnceLock;
use zkyc_core::FieldElement;

/// A collision-resistant hash from an ordered sequence of field elements to one
/// field element. Implementations must be deterministic.
pub trait FieldHasher: Send + Sync {
    fn hash(&self, inputs: &[FieldElement]) -> FieldElement;

    /// Stable name, recorded next to commitments so mismatched hashers are
    /// detectable.
    fn name(&self) -> &'static str;
}

static POSEIDON_CONFIG: OnceLock<PoseidonConfig<Fr>> = OnceLock::new();

fn poseidon_config() -> &'static PoseidonConfig<Fr> {
    POSEIDON_CONFIG.get_or_init(|| {
        let rate = 2;
        let alpha = 5u64;
        let full_rounds = 8;
        let partial_rounds = 57;
        let field_bits = 254;

        let (ark, mds) =
            find_poseidon_ark_and_mds::<Fr>(field_bits, rate, full_rounds, partial_rounds, 0);

        PoseidonConfig {
            full_rounds: full_rounds as usize,
            partial_rounds: partial_rounds as usize,
            alpha,
            ark,
            mds,
            rate,
            capacity: 1,
        }
    })
}

/// Poseidon sponge over BN254. Returns the first squeezed element.
///
/// The sponge does not encode input length, so every call site must use a
/// fixed arity.
#[derive(Debug, Clone, Copy, Default)]
pub struct PoseidonHasher;

impl FieldHasher for PoseidonHasher {
    fn hash(&self, inputs: &[FieldElement]) -> FieldElement {
        let mut sponge = PoseidonSponge::new(poseidon_config());
        for input in inputs {
            let fr: Fr = (*input).into();
            sponge.absorb(&fr);
        }
        let output: Vec<Fr> = sponge.squeeze_field_elements(1);
        FieldElement::from(output[0])
    }

    fn name(&self) -> &'static str {
        "poseidon-bn254-t3"
    }
}

/// BLAKE3 over the canonical encodings, reduced into the field.
///
/// Not provable inside an arithmetic circuit. Suitable for the development
/// backend and tests only.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3FieldHasher;

const BLAKE3_DOMAIN: &str = "zkyc field hash v1";

impl FieldHasher for Blake3FieldHasher {
    fn hash(&self, inputs: &[FieldElement]) -> FieldElement {
        let mut hasher = blake3::Hasher::new_derive_key(BLAKE3_DOMAIN);
        hasher.update(&(inputs.len() as u64).to_le_bytes());
        for input in inputs {
            hasher.update(&input.to_le_bytes());
        }
        FieldElement::from_le_bytes_mod_order(hasher.finalize().as_bytes())
    }

    fn name(&self) -> &'static str {
        "blake3-reduced"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fe(n: u64) -> FieldElement {
        FieldElement::from_u64(n)
    }

    #[test]
    fn test_poseidon_deterministic() {
        let h = PoseidonHasher;
        assert_eq!(h.hash(&[fe(1), fe(2)]), h.hash(&[fe(1), fe(2)]));
    }

    #[test]
    fn test_poseidon_order_sensitive() {
        let h = PoseidonHasher;
        assert_ne!(h.hash(&[fe(1), fe(2)]), h.hash(&[fe(2), fe(1)]));
    }

    #[test]
    fn test_poseidon_not_identity() {
        let h = PoseidonHasher;
        assert_ne!(h.hash(&[fe(0)]), fe(0));
        assert_ne!(h.hash(&[fe(5)]), fe(5));
    }

    #[test]
    fn test_blake3_length_prefixed() {
        let h = Blake3FieldHasher;
        assert_ne!(h.hash(&[]), h.hash(&[fe(0)]));
        assert_ne!(h.hash(&[fe(7)]), h.hash(&[fe(7), fe(0)]));
    }

    #[test]
    fn test_hashers_disagree() {
        let inputs = [fe(42)];
        assert_ne!(PoseidonHasher.hash(&inputs), Blake3FieldHasher.hash(&inputs));
        assert_ne!(PoseidonHasher.name(), Blake3FieldHasher.name());
    }
}
