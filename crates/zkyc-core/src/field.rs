//! Scalar field elements of BN254, the curve the Groth16 circuits are built over.
//!
//! Every commitment, nullifier and public signal in the protocol is one of these.
//! On the wire they travel as base-10 strings, the same encoding snarkjs uses
//! for `publicSignals`.

use ark_bn254::Fr;
use ark_ff::{BigInteger, PrimeField};
use num_bigint::BigUint;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Errors produced when decoding a field element.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("empty field element")]
    Empty,

    #[error("not a base-10 integer: {0}")]
    NotDecimal(String),

    #[error("value does not fit the scalar field: {0}")]
    OutOfRange(String),
}

/// An element of the BN254 scalar field.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FieldElement(Fr);

impl FieldElement {
    pub fn zero() -> Self {
        Self(Fr::from(0u64))
    }

    pub fn one() -> Self {
        Self(Fr::from(1u64))
    }

    pub fn from_u64(value: u64) -> Self {
        Self(Fr::from(value))
    }

    pub fn from_u128(value: u128) -> Self {
        Self(Fr::from(value))
    }

    pub fn from_bool(value: bool) -> Self {
        if value {
            Self::one()
        } else {
            Self::zero()
        }
    }

    /// Interpret little-endian bytes as an integer and reduce it modulo r.
    pub fn from_le_bytes_mod_order(bytes: &[u8]) -> Self {
        Self(Fr::from_le_bytes_mod_order(bytes))
    }

    /// Interpret big-endian bytes as an integer and reduce it modulo r.
    pub fn from_be_bytes_mod_order(bytes: &[u8]) -> Self {
        Self(Fr::from_be_bytes_mod_order(bytes))
    }

    /// Parse a base-10 string. Values at or above the field modulus are
    /// rejected rather than silently wrapped.
    pub fn parse_decimal(s: &str) -> Result<Self, FieldError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(FieldError::Empty);
        }
        if !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(FieldError::NotDecimal(s.to_string()));
        }
        let value = BigUint::parse_bytes(s.as_bytes(), 10)
            .ok_or_else(|| FieldError::NotDecimal(s.to_string()))?;
        if value >= Self::modulus() {
            return Err(FieldError::OutOfRange(s.to_string()));
        }
        Ok(Self(Fr::from_le_bytes_mod_order(&value.to_bytes_le())))
    }

    /// The field modulus r as an arbitrary-precision integer.
    pub fn modulus() -> BigUint {
        BigUint::from_bytes_le(&Fr::MODULUS.to_bytes_le())
    }

    /// Canonical base-10 representation.
    pub fn to_decimal(&self) -> String {
        self.to_biguint().to_string()
    }

    /// Canonical 32-byte little-endian representation.
    pub fn to_le_bytes(&self) -> [u8; 32] {
        let bytes = self.0.into_bigint().to_bytes_le();
        let mut out = [0u8; 32];
        out.copy_from_slice(&bytes[..32]);
        out
    }

    /// The value as a `u64`, if it fits.
    pub fn as_u64(&self) -> Option<u64> {
        let bytes = self.to_le_bytes();
        if bytes[8..].iter().any(|b| *b != 0) {
            return None;
        }
        let mut low = [0u8; 8];
        low.copy_from_slice(&bytes[..8]);
        Some(u64::from_le_bytes(low))
    }

    /// Decode a 0/1 signal.
    pub fn as_bit(&self) -> Option<bool> {
        match self.as_u64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None,
        }
    }

    pub fn inner(&self) -> Fr {
        self.0
    }

    fn to_biguint(self) -> BigUint {
        BigUint::from_bytes_le(&self.0.into_bigint().to_bytes_le())
    }
}

impl From<Fr> for FieldElement {
    fn from(value: Fr) -> Self {
        Self(value)
    }
}

impl From<FieldElement> for Fr {
    fn from(value: FieldElement) -> Self {
        value.0
    }
}

impl FromStr for FieldElement {
    type Err = FieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_decimal(s)
    }
}

impl fmt::Display for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_decimal())
    }
}

impl fmt::Debug for FieldElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldElement({})", self.to_decimal())
    }
}

impl Serialize for FieldElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_decimal())
    }
}

impl<'de> Deserialize<'de> for FieldElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse_decimal(&s).map_err(serde::de::Error::custom)
    }
}
