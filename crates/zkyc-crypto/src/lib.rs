//! zkyc Crypto — deterministic commitments and nullifiers over an injected
//! field hasher, and Ed25519 signing for API callers.

pub mod commitment;
pub mod error;
pub mod hashing;
pub mod signing;

pub use commitment::{
    aadhaar_hash, nullifier_hash, parse_aadhaar_number, parse_birth_date, random_field_element,
    secret_hash, state_commitment, CredentialOpening,
};
pub use error::CryptoError;
pub use hashing::{Blake3FieldHasher, FieldHasher, PoseidonHasher};
pub use signing::{actions, KeyPair, Opened, PublicKey, Signature, SignedEnvelope, SignedPayload};
