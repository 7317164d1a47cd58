//! Age-threshold circuit: input layout and native relation.

use chrono::{Datelike, NaiveDate};
use zkyc_core::{AccountId, BackendError, CircuitInputs, FieldElement, RequestId, AGE_THRESHOLD};
use zkyc_crypto::{CredentialOpening, FieldHasher};

/// Every signal the age circuit reads.
pub const AGE_INPUTS: &[&str] = &[
    "aadhaarNumber",
    "birthYear",
    "birthMonth",
    "birthDay",
    "salt",
    "secret",
    "currentYear",
    "currentMonth",
    "currentDay",
    "aadhaarHash",
    "secretHash",
    "requestIdentifier",
    "verifierIdentifier",
    "nullifierHash",
];

/// Whole years between a birth date and `today`, one less if the birthday
/// has not yet come this year.
pub fn compute_age(
    birth_year: u64,
    birth_month: u64,
    birth_day: u64,
    today_year: u64,
    today_month: u64,
    today_day: u64,
) -> i64 {
    let mut age = today_year as i64 - birth_year as i64;
    if today_month < birth_month || (today_month == birth_month && today_day < birth_day) {
        age -= 1;
    }
    age
}

pub fn age_on(birth_date: NaiveDate, today: NaiveDate) -> i64 {
    compute_age(
        birth_date.year() as u64,
        birth_date.month() as u64,
        birth_date.day() as u64,
        today.year() as u64,
        today.month() as u64,
        today.day() as u64,
    )
}

/// Build the flat input mapping for an age proof.
pub fn age_inputs<H: FieldHasher + ?Sized>(
    hasher: &H,
    opening: &CredentialOpening,
    request_id: RequestId,
    requester: &AccountId,
    today: NaiveDate,
) -> CircuitInputs {
    let commitments = opening.commitments(hasher);
    let mut inputs = CircuitInputs::new();
    inputs
        .set("aadhaarNumber", opening.aadhaar_number)
        .set("birthYear", FieldElement::from_u64(opening.birth_date.year() as u64))
        .set("birthMonth", FieldElement::from_u64(opening.birth_date.month() as u64))
        .set("birthDay", FieldElement::from_u64(opening.birth_date.day() as u64))
        .set("salt", opening.salt)
        .set("secret", opening.secret)
        .set("currentYear", FieldElement::from_u64(today.year() as u64))
        .set("currentMonth", FieldElement::from_u64(today.month() as u64))
        .set("currentDay", FieldElement::from_u64(today.day() as u64))
        .set("aadhaarHash", commitments.aadhaar_hash)
        .set("secretHash", commitments.secret_hash)
        .set("requestIdentifier", request_id.to_field())
        .set("verifierIdentifier", requester.to_field())
        .set("nullifierHash", opening.nullifier(hasher, request_id, requester));
    inputs
}

fn small(inputs: &CircuitInputs, name: &str) -> Result<u64, BackendError> {
    let value = inputs
        .get(name)
        .ok_or_else(|| BackendError::Unsatisfied(format!("missing signal {}", name)))?;
    value
        .as_u64()
        .ok_or_else(|| BackendError::Unsatisfied(format!("{} out of range", name)))
}

fn signal(inputs: &CircuitInputs, name: &str) -> Result<FieldElement, BackendError> {
    inputs
        .get(name)
        .ok_or_else(|| BackendError::Unsatisfied(format!("missing signal {}", name)))
}

/// Evaluate the age relation natively. Errors when a constraint fails,
/// otherwise returns the result bit.
pub fn evaluate_age<H: FieldHasher + ?Sized>(
    hasher: &H,
    inputs: &CircuitInputs,
) -> Result<bool, BackendError> {
    let birth_year = small(inputs, "birthYear")?;
    let birth_month = small(inputs, "birthMonth")?;
    let birth_day = small(inputs, "birthDay")?;
    let secret = signal(inputs, "secret")?;

    let aadhaar_hash = hasher.hash(&[
        signal(inputs, "aadhaarNumber")?,
        FieldElement::from_u64(birth_year),
        FieldElement::from_u64(birth_month),
        FieldElement::from_u64(birth_day),
        signal(inputs, "salt")?,
    ]);
    if aadhaar_hash != signal(inputs, "aadhaarHash")? {
        return Err(BackendError::Unsatisfied("aadhaarHash does not open".into()));
    }
    if hasher.hash(&[secret]) != signal(inputs, "secretHash")? {
        return Err(BackendError::Unsatisfied("secretHash does not open".into()));
    }
    let nullifier = hasher.hash(&[
        secret,
        signal(inputs, "requestIdentifier")?,
        signal(inputs, "verifierIdentifier")?,
    ]);
    if nullifier != signal(inputs, "nullifierHash")? {
        return Err(BackendError::Unsatisfied("nullifierHash mismatch".into()));
    }

    let age = compute_age(
        birth_year,
        birth_month,
        birth_day,
        small(inputs, "currentYear")?,
        small(inputs, "currentMonth")?,
        small(inputs, "currentDay")?,
    );
    Ok(age >= AGE_THRESHOLD as i64)
}
