use serde::{Deserialize, Serialize};
use zkyc_core::{AccountId, Amount, FieldElement, PredicateKind, RequestId};

/// Notifications broadcast after a mutation is durable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum LedgerEvent {
    CredentialIssued {
        subject: AccountId,
        label: String,
    },
    CredentialRevoked {
        subject: AccountId,
        secret_hash: FieldElement,
    },
    VerificationRequested {
        request_id: RequestId,
        kind: PredicateKind,
        requester: AccountId,
        subject: AccountId,
        fee: Amount,
    },
    VerificationCompleted {
        request_id: RequestId,
        result: bool,
    },
}
