//! Durable persistence for the ledger of record.
//!
//! Every mutating ledger operation is written as one [`StoreBatch`] before the
//! in-memory state changes. A store must apply a batch atomically.

use std::collections::BTreeMap;
use std::sync::Mutex;
use zkyc_core::{AccountId, CredentialRecord, FieldElement, ProtocolError, RequestId, VerificationRequest};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("backend error: {0}")]
    Backend(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl From<StoreError> for ProtocolError {
    fn from(e: StoreError) -> Self {
        ProtocolError::Storage(e.to_string())
    }
}

/// One write inside a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreOp {
    PutCredential {
        subject: AccountId,
        record: CredentialRecord,
    },
    AddRevocation(FieldElement),
    PutRequest(VerificationRequest),
    AddNullifier {
        nullifier: FieldElement,
        request_id: RequestId,
    },
    SetNextRequestId(RequestId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreBatch {
    ops: Vec<StoreOp>,
}

impl StoreBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: StoreOp) -> &mut Self {
        self.ops.push(op);
        self
    }

    pub fn ops(&self) -> &[StoreOp] {
        &self.ops
    }

    pub fn into_ops(self) -> Vec<StoreOp> {
        self.ops
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Everything needed to rebuild ledger state on open.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub credentials: BTreeMap<AccountId, CredentialRecord>,
    pub revocations: Vec<FieldElement>,
    pub requests: BTreeMap<RequestId, VerificationRequest>,
    pub nullifiers: BTreeMap<FieldElement, RequestId>,
    pub next_request_id: Option<RequestId>,
}

impl LedgerSnapshot {
    pub fn apply(&mut self, op: StoreOp) {
        match op {
            StoreOp::PutCredential { subject, record } => {
                self.credentials.insert(subject, record);
            }
            StoreOp::AddRevocation(secret_hash) => {
                if !self.revocations.contains(&secret_hash) {
                    self.revocations.push(secret_hash);
                }
            }
            StoreOp::PutRequest(request) => {
                self.requests.insert(request.id, request);
            }
            StoreOp::AddNullifier {
                nullifier,
                request_id,
            } => {
                self.nullifiers.insert(nullifier, request_id);
            }
            StoreOp::SetNextRequestId(id) => {
                self.next_request_id = Some(id);
            }
        }
    }
}

/// Atomic batch persistence.
pub trait LedgerStore: Send + Sync {
    fn commit(&self, batch: StoreBatch) -> Result<(), StoreError>;

    fn load(&self) -> Result<LedgerSnapshot, StoreError>;
}

/// Volatile store for tests and single-process demos.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: Mutex<LedgerSnapshot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LedgerStore for MemoryStore {
    fn commit(&self, batch: StoreBatch) -> Result<(), StoreError> {
        let mut snapshot = self
            .snapshot
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))?;
        for op in batch.into_ops() {
            snapshot.apply(op);
        }
        Ok(())
    }

    fn load(&self) -> Result<LedgerSnapshot, StoreError> {
        self.snapshot
            .lock()
            .map(|s| s.clone())
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}
