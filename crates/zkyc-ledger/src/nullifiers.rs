use std::collections::BTreeMap;
use zkyc_core::{FieldElement, RequestId};

/// Global append-only set of consumed nullifiers, remembering which request
/// consumed each one.
#[derive(Debug, Clone, Default)]
pub struct NullifierSet {
    used: BTreeMap<FieldElement, RequestId>,
}

impl NullifierSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn restore(entries: impl IntoIterator<Item = (FieldElement, RequestId)>) -> Self {
        Self {
            used: entries.into_iter().collect(),
        }
    }

    /// Returns `false` without modifying the set if the nullifier was already
    /// consumed.
    pub fn insert(&mut self, nullifier: FieldElement, request_id: RequestId) -> bool {
        if self.used.contains_key(&nullifier) {
            return false;
        }
        self.used.insert(nullifier, request_id);
        true
    }

    pub fn contains(&self, nullifier: &FieldElement) -> bool {
        self.used.contains_key(nullifier)
    }

    pub fn consumed_by(&self, nullifier: &FieldElement) -> Option<RequestId> {
        self.used.get(nullifier).copied()
    }

    pub fn len(&self) -> usize {
        self.used.len()
    }

    pub fn is_empty(&self) -> bool {
        self.used.is_empty()
    }
}
