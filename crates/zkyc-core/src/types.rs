use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::error::ProtocolError;
use crate::field::FieldElement;
use crate::request_state::VerificationState;

/// Age predicate threshold in whole years. Fixed by the circuit, never carried
/// in request parameters.
pub const AGE_THRESHOLD: u32 = 18;

/// A 20-byte account identifier, written as `0x`-prefixed hex.
///
/// Subjects, requesters, the issuer and the treasury are all accounts. Inside
/// circuits an account is the big-endian integer value of its bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AccountId(pub [u8; 20]);

impl AccountId {
    /// Build an account whose trailing bytes hold `n`. Used for well-known
    /// development accounts.
    pub fn from_low_u64(n: u64) -> Self {
        let mut bytes = [0u8; 20];
        bytes[12..].copy_from_slice(&n.to_be_bytes());
        Self(bytes)
    }

    /// Parse `0x`-prefixed (or bare) 40-character hex.
    pub fn parse(s: &str) -> Result<Self, ProtocolError> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let raw = hex::decode(digits)
            .map_err(|e| ProtocolError::InvalidInput(format!("account '{}': {}", s, e)))?;
        let bytes: [u8; 20] = raw.try_into().map_err(|_| {
            ProtocolError::InvalidInput(format!("account '{}' must be 20 bytes", s))
        })?;
        Ok(Self(bytes))
    }

    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Field encoding used for the `requesterIdentifier` signal.
    pub fn to_field(&self) -> FieldElement {
        FieldElement::from_be_bytes_mod_order(&self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for AccountId {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for AccountId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for AccountId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}

/// Identifier of a verification request. One counter per deployment, first id is 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(pub u64);

impl RequestId {
    pub fn to_field(&self) -> FieldElement {
        FieldElement::from_u64(self.0)
    }

    pub fn next(&self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A fee amount in the rail's smallest unit (wei for the original deployment).
/// Serialized as a decimal string so it survives JSON and TOML intact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Amount(pub u128);

impl Amount {
    pub const ZERO: Amount = Amount(0);

    pub fn units(&self) -> u128 {
        self.0
    }

    pub fn checked_add(self, other: Amount) -> Option<Amount> {
        self.0.checked_add(other.0).map(Amount)
    }

    pub fn checked_sub(self, other: Amount) -> Option<Amount> {
        self.0.checked_sub(other.0).map(Amount)
    }

    /// The share of this amount expressed in basis points, rounded down.
    pub fn basis_points(self, bps: u16) -> Amount {
        Amount(self.0 / 10_000 * bps as u128 + self.0 % 10_000 * bps as u128 / 10_000)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u128>()
            .map(Amount)
            .map_err(|e| ProtocolError::InvalidInput(format!("amount '{}': {}", s, e)))
    }
}

impl Serialize for Amount {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0.to_string())
    }
}

impl<'de> Deserialize<'de> for Amount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// The predicate a verification request asks about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PredicateKind {
    /// Subject is at least [`AGE_THRESHOLD`] years old.
    AgeThreshold,
    /// Subject's committed state code equals a required one.
    StateEquality,
}

impl PredicateKind {
    pub const ALL: [PredicateKind; 2] = [PredicateKind::AgeThreshold, PredicateKind::StateEquality];

    /// Name of the public signal at the credential-commitment position.
    pub fn commitment_signal(&self) -> &'static str {
        match self {
            Self::AgeThreshold => "aadhaarHash",
            Self::StateEquality => "stateCommitment",
        }
    }

    /// Circuit name used to locate artifacts on disk.
    pub fn circuit_name(&self) -> &'static str {
        match self {
            Self::AgeThreshold => "age_verification",
            Self::StateEquality => "state_verification",
        }
    }

    /// The credential commitment this kind binds to.
    pub fn bound_commitment(&self, commitments: &CredentialCommitments) -> FieldElement {
        match self {
            Self::AgeThreshold => commitments.aadhaar_hash,
            Self::StateEquality => commitments.state_commitment,
        }
    }
}

impl fmt::Display for PredicateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AgeThreshold => write!(f, "age_threshold"),
            Self::StateEquality => write!(f, "state_equality"),
        }
    }
}

impl FromStr for PredicateKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "age_threshold" | "age" => Ok(Self::AgeThreshold),
            "state_equality" | "state" => Ok(Self::StateEquality),
            other => Err(ProtocolError::InvalidInput(format!(
                "unknown predicate kind: {}",
                other
            ))),
        }
    }
}

/// Kind-specific public parameters of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PredicateParams {
    AgeThreshold,
    StateEquality { required_state: u32 },
}

impl PredicateParams {
    pub fn kind(&self) -> PredicateKind {
        match self {
            Self::AgeThreshold => PredicateKind::AgeThreshold,
            Self::StateEquality { .. } => PredicateKind::StateEquality,
        }
    }

    /// The compiled circuit whose proof answers these parameters.
    pub fn circuit(&self) -> CircuitId {
        match self {
            Self::AgeThreshold => CircuitId::age_threshold(),
            Self::StateEquality { required_state } => CircuitId::state_equality(*required_state),
        }
    }
}

/// Identifies one compiled circuit and therefore one verification key.
///
/// The state-equality circuit fixes the required state as a constant, so
/// each required state is a separate circuit with its own key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CircuitId {
    pub kind: PredicateKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required_state: Option<u32>,
}

impl CircuitId {
    pub fn age_threshold() -> Self {
        Self {
            kind: PredicateKind::AgeThreshold,
            required_state: None,
        }
    }

    pub fn state_equality(required_state: u32) -> Self {
        Self {
            kind: PredicateKind::StateEquality,
            required_state: Some(required_state),
        }
    }
}

impl fmt::Display for CircuitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.required_state {
            Some(state) => write!(f, "{}/{}", self.kind, state),
            None => write!(f, "{}", self.kind),
        }
    }
}

/// The three commitments an issuer publishes for a subject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialCommitments {
    pub aadhaar_hash: FieldElement,
    pub secret_hash: FieldElement,
    pub state_commitment: FieldElement,
}

/// The registry's record for one subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub aadhaar_hash: FieldElement,
    pub secret_hash: FieldElement,
    pub state_commitment: FieldElement,
    /// Free-form display label chosen by the issuer.
    pub label: String,
    pub is_active: bool,
    pub issued_at: DateTime<Utc>,
}

impl CredentialRecord {
    pub fn commitments(&self) -> CredentialCommitments {
        CredentialCommitments {
            aadhaar_hash: self.aadhaar_hash,
            secret_hash: self.secret_hash,
            state_commitment: self.state_commitment,
        }
    }
}

/// A predicate verification request and, once settled, its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationRequest {
    pub id: RequestId,
    pub kind: PredicateKind,
    pub requester: AccountId,
    pub subject: AccountId,
    pub params: PredicateParams,
    pub fee: Amount,
    pub state: VerificationState,
    /// Meaningful only once `state` is `Completed`.
    pub result: bool,
    pub nullifier_hash: Option<FieldElement>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl VerificationRequest {
    pub fn is_completed(&self) -> bool {
        self.state == VerificationState::Completed
    }
}

/// Outcome of `getResult`: `(completed, result)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationOutcome {
    pub completed: bool,
    pub result: bool,
}

/// Advertised support for one predicate kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KindCapability {
    pub kind: PredicateKind,
    pub minimum_fee: Amount,
    pub public_signals: usize,
    /// State codes with a loaded circuit (state equality only).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_states: Vec<u32>,
}

/// Versioned description of what a deployment supports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub protocol_version: String,
    pub issuer: AccountId,
    pub subject_reward_bps: u16,
    pub kinds: Vec<KindCapability>,
}
