use serde::{Deserialize, Serialize};
use std::fmt;

use crate::field::{FieldElement, FieldError};
use crate::types::{AccountId, Amount, PredicateKind, RequestId};

/// Errors raised by protocol operations.
///
/// Every variant is terminal for the operation that raised it. None of them
/// leave partial state behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProtocolError {
    #[error("caller {caller} is not authorized to {action}")]
    Unauthorized { caller: AccountId, action: String },

    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("request {request_id} is already completed")]
    AlreadyCompleted { request_id: RequestId },

    #[error("fee {fee} below minimum {minimum} for {kind}")]
    InsufficientFee {
        kind: PredicateKind,
        fee: Amount,
        minimum: Amount,
    },

    #[error("subject {subject} has no valid credential")]
    NoValidCredential { subject: AccountId },

    #[error("credential of subject {subject} is revoked (request {request_id})")]
    CredentialRevoked {
        request_id: RequestId,
        subject: AccountId,
    },

    #[error("public signal '{signal}' does not match request {request_id}")]
    CommitmentMismatch {
        request_id: RequestId,
        signal: &'static str,
    },

    #[error("nullifier {nullifier} already used (request {request_id})")]
    NullifierReused {
        request_id: RequestId,
        nullifier: FieldElement,
    },

    #[error("proof rejected by verifier for request {request_id}")]
    InvalidProof { request_id: RequestId },

    #[error("prover error: {0}")]
    ProverError(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("payment failed: {0}")]
    PaymentFailed(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("verifier unavailable for request {request_id}: {reason}")]
    VerifierUnavailable {
        request_id: RequestId,
        reason: String,
    },
}

impl ProtocolError {
    pub fn credential_not_found(subject: &AccountId) -> Self {
        Self::NotFound {
            entity: "credential",
            key: subject.to_string(),
        }
    }

    pub fn request_not_found(id: RequestId) -> Self {
        Self::NotFound {
            entity: "request",
            key: id.to_string(),
        }
    }

    /// The flat kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthorized { .. } => ErrorKind::Unauthorized,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::AlreadyCompleted { .. } => ErrorKind::AlreadyCompleted,
            Self::InsufficientFee { .. } => ErrorKind::InsufficientFee,
            Self::NoValidCredential { .. } => ErrorKind::NoValidCredential,
            Self::CredentialRevoked { .. } => ErrorKind::CredentialRevoked,
            Self::CommitmentMismatch { .. } => ErrorKind::CommitmentMismatch,
            Self::NullifierReused { .. } => ErrorKind::NullifierReused,
            Self::InvalidProof { .. } => ErrorKind::InvalidProof,
            Self::ProverError(_) => ErrorKind::ProverError,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::PaymentFailed(_) => ErrorKind::PaymentFailed,
            Self::Storage(_) => ErrorKind::Storage,
            Self::VerifierUnavailable { .. } => ErrorKind::VerifierUnavailable,
        }
    }

    /// Whether a caller may retry the same operation unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ProverError(_) | Self::VerifierUnavailable { .. } | Self::Storage(_)
        )
    }
}

impl From<FieldError> for ProtocolError {
    fn from(e: FieldError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

/// Error kinds without context, for callers that only branch on the kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    AlreadyCompleted,
    InsufficientFee,
    NoValidCredential,
    CredentialRevoked,
    CommitmentMismatch,
    NullifierReused,
    InvalidProof,
    ProverError,
    InvalidInput,
    PaymentFailed,
    Storage,
    VerifierUnavailable,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        let err = ProtocolError::AlreadyCompleted {
            request_id: RequestId(4),
        };
        assert_eq!(err.kind(), ErrorKind::AlreadyCompleted);
        assert_eq!(err.to_string(), "request 4 is already completed");
    }

    #[test]
    fn test_mismatch_names_the_signal() {
        let err = ProtocolError::CommitmentMismatch {
            request_id: RequestId(6),
            signal: "requestId",
        };
        assert!(err.to_string().contains("requestId"));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_field_error_is_invalid_input() {
        let err: ProtocolError = FieldError::Empty.into();
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    #[test]
    fn test_not_found_context() {
        let err = ProtocolError::request_not_found(RequestId(99));
        assert_eq!(err.to_string(), "request not found: 99");
        assert_eq!(ErrorKind::NotFound.to_string(), "NotFound");
    }
}
