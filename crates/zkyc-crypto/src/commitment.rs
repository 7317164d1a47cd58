use chrono::{Datelike, NaiveDate};
use rand::{CryptoRng, RngCore};
use serde::{Deserialize, Serialize};
use zkyc_core::{AccountId, CredentialCommitments, FieldElement, RequestId};

use crate::error::CryptoError;
use crate::hashing::FieldHasher;

/// Length of an Aadhaar number in decimal digits.
pub const AADHAAR_DIGITS: usize = 12;

/// `H(aadhaarNumber, birthYear, birthMonth, birthDay, salt)`.
pub fn aadhaar_hash<H: FieldHasher + ?Sized>(
    hasher: &H,
    aadhaar_number: FieldElement,
    birth_date: NaiveDate,
    salt: FieldElement,
) -> FieldElement {
    hasher.hash(&[
        aadhaar_number,
        FieldElement::from_u64(birth_date.year() as u64),
        FieldElement::from_u64(birth_date.month() as u64),
        FieldElement::from_u64(birth_date.day() as u64),
        salt,
    ])
}

/// `H(secret)`.
pub fn secret_hash<H: FieldHasher + ?Sized>(hasher: &H, secret: FieldElement) -> FieldElement {
    hasher.hash(&[secret])
}

/// `H(stateCode, stateSalt)`.
pub fn state_commitment<H: FieldHasher + ?Sized>(
    hasher: &H,
    state_code: u32,
    state_salt: FieldElement,
) -> FieldElement {
    hasher.hash(&[FieldElement::from_u64(state_code as u64), state_salt])
}

/// `H(secret, requestId, requesterIdentifier)`. One nullifier per request and
/// requester for a given secret.
pub fn nullifier_hash<H: FieldHasher + ?Sized>(
    hasher: &H,
    secret: FieldElement,
    request_id: RequestId,
    requester: &AccountId,
) -> FieldElement {
    hasher.hash(&[secret, request_id.to_field(), requester.to_field()])
}

/// 32 random bytes reduced into the field.
pub fn random_field_element<R: RngCore + CryptoRng>(rng: &mut R) -> FieldElement {
    let mut bytes = [0u8; 32];
    rng.fill_bytes(&mut bytes);
    FieldElement::from_le_bytes_mod_order(&bytes)
}

/// Parse a 12-digit Aadhaar number into a field element.
pub fn parse_aadhaar_number(s: &str) -> Result<FieldElement, CryptoError> {
    let s = s.trim();
    if s.len() != AADHAAR_DIGITS || !s.bytes().all(|b| b.is_ascii_digit()) {
        return Err(CryptoError::InvalidInput(format!(
            "aadhaar number must be {} digits",
            AADHAAR_DIGITS
        )));
    }
    FieldElement::parse_decimal(s).map_err(|e| CryptoError::InvalidInput(e.to_string()))
}

/// Parse an ISO 8601 (`YYYY-MM-DD`) birth date.
pub fn parse_birth_date(s: &str) -> Result<NaiveDate, CryptoError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| CryptoError::InvalidDate(format!("'{}': {}", s, e)))
}

/// The private opening of a credential. Held by the subject, never published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialOpening {
    pub aadhaar_number: FieldElement,
    pub birth_date: NaiveDate,
    pub salt: FieldElement,
    pub secret: FieldElement,
    pub state_code: u32,
    pub state_salt: FieldElement,
}

impl CredentialOpening {
    /// Draw fresh salts and a fresh secret for the given attributes.
    pub fn generate<R: RngCore + CryptoRng>(
        rng: &mut R,
        aadhaar_number: FieldElement,
        birth_date: NaiveDate,
        state_code: u32,
    ) -> Self {
        Self {
            aadhaar_number,
            birth_date,
            salt: random_field_element(rng),
            secret: random_field_element(rng),
            state_code,
            state_salt: random_field_element(rng),
        }
    }

    pub fn commitments<H: FieldHasher + ?Sized>(&self, hasher: &H) -> CredentialCommitments {
        CredentialCommitments {
            aadhaar_hash: aadhaar_hash(hasher, self.aadhaar_number, self.birth_date, self.salt),
            secret_hash: secret_hash(hasher, self.secret),
            state_commitment: state_commitment(hasher, self.state_code, self.state_salt),
        }
    }

    pub fn nullifier<H: FieldHasher + ?Sized>(
        &self,
        hasher: &H,
        request_id: RequestId,
        requester: &AccountId,
    ) -> FieldElement {
        nullifier_hash(hasher, self.secret, request_id, requester)
    }
}
