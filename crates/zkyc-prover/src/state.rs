//! State-equality circuit: input layout and native relation.

use zkyc_core::{AccountId, BackendError, CircuitInputs, FieldElement, RequestId};
use zkyc_crypto::{CredentialOpening, FieldHasher};

pub const STATE_INPUTS: &[&str] = &[
    "userState",
    "stateSalt",
    "secret",
    "requiredState",
    "stateCommitment",
    "secretHash",
    "requestIdentifier",
    "verifierIdentifier",
    "nullifierHash",
];

pub fn state_inputs<H: FieldHasher + ?Sized>(
    hasher: &H,
    opening: &CredentialOpening,
    request_id: RequestId,
    requester: &AccountId,
    required_state: u32,
) -> CircuitInputs {
    let commitments = opening.commitments(hasher);
    let mut inputs = CircuitInputs::new();
    inputs
        .set("userState", FieldElement::from_u64(opening.state_code as u64))
        .set("stateSalt", opening.state_salt)
        .set("secret", opening.secret)
        .set("requiredState", FieldElement::from_u64(required_state as u64))
        .set("stateCommitment", commitments.state_commitment)
        .set("secretHash", commitments.secret_hash)
        .set("requestIdentifier", request_id.to_field())
        .set("verifierIdentifier", requester.to_field())
        .set("nullifierHash", opening.nullifier(hasher, request_id, requester));
    inputs
}

/// The state code a set of inputs was assembled for. It selects which
/// compiled circuit proves them.
pub fn required_state(inputs: &CircuitInputs) -> Result<u32, BackendError> {
    inputs
        .get("requiredState")
        .and_then(|value| value.as_u64())
        .and_then(|code| u32::try_from(code).ok())
        .ok_or_else(|| BackendError::Unsatisfied("requiredState is missing or out of range".into()))
}

/// Evaluate the state relation natively. The result bit is
/// `userState == requiredState`; a mismatch is a valid `false`, not a
/// constraint failure.
pub fn evaluate_state<H: FieldHasher + ?Sized>(
    hasher: &H,
    inputs: &CircuitInputs,
) -> Result<bool, BackendError> {
    let get = |name: &str| {
        inputs
            .get(name)
            .ok_or_else(|| BackendError::Unsatisfied(format!("missing signal {}", name)))
    };
    let user_state = get("userState")?;
    let secret = get("secret")?;

    if hasher.hash(&[user_state, get("stateSalt")?]) != get("stateCommitment")? {
        return Err(BackendError::Unsatisfied("stateCommitment does not open".into()));
    }
    if hasher.hash(&[secret]) != get("secretHash")? {
        return Err(BackendError::Unsatisfied("secretHash does not open".into()));
    }
    let nullifier = hasher.hash(&[
        secret,
        get("requestIdentifier")?,
        get("verifierIdentifier")?,
    ]);
    if nullifier != get("nullifierHash")? {
        return Err(BackendError::Unsatisfied("nullifierHash mismatch".into()));
    }

    Ok(user_state == get("requiredState")?)
}
