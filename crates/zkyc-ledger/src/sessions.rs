use std::collections::{BTreeMap, BTreeSet};
use zkyc_core::{
    AccountId, ProtocolError, RequestId, VerificationOutcome, VerificationRequest,
    VerificationState,
};

/// Verification requests, the per-subject pending index and the id counter.
///
/// Ids come from one counter shared by every kind, so creation order and id
/// order coincide.
#[derive(Debug, Clone)]
pub struct SessionBook {
    requests: BTreeMap<RequestId, VerificationRequest>,
    pending: BTreeMap<AccountId, BTreeSet<RequestId>>,
    next_id: RequestId,
}

impl Default for SessionBook {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionBook {
    pub fn new() -> Self {
        Self {
            requests: BTreeMap::new(),
            pending: BTreeMap::new(),
            next_id: RequestId(1),
        }
    }

    /// Rebuild from persisted requests. The pending index is derived, never
    /// stored.
    pub fn restore(
        requests: impl IntoIterator<Item = VerificationRequest>,
        next_id: Option<RequestId>,
    ) -> Self {
        let mut book = Self::new();
        for request in requests {
            if request.state == VerificationState::Pending {
                book.pending
                    .entry(request.subject)
                    .or_default()
                    .insert(request.id);
            }
            if request.id >= book.next_id {
                book.next_id = request.id.next();
            }
            book.requests.insert(request.id, request);
        }
        if let Some(id) = next_id {
            book.next_id = book.next_id.max(id);
        }
        book
    }

    /// The id the next created request will receive.
    pub fn next_id(&self) -> RequestId {
        self.next_id
    }

    pub fn apply_created(&mut self, request: VerificationRequest) {
        self.next_id = self.next_id.max(request.id.next());
        self.pending
            .entry(request.subject)
            .or_default()
            .insert(request.id);
        self.requests.insert(request.id, request);
    }

    pub fn apply_completed(&mut self, request: VerificationRequest) {
        if let Some(ids) = self.pending.get_mut(&request.subject) {
            ids.remove(&request.id);
            if ids.is_empty() {
                self.pending.remove(&request.subject);
            }
        }
        self.requests.insert(request.id, request);
    }

    pub fn get(&self, id: RequestId) -> Result<&VerificationRequest, ProtocolError> {
        self.requests
            .get(&id)
            .ok_or_else(|| ProtocolError::request_not_found(id))
    }

    /// Pending request ids for a subject, oldest first.
    pub fn pending_for(&self, subject: &AccountId) -> Vec<RequestId> {
        self.pending
            .get(subject)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn outcome(&self, id: RequestId) -> Result<VerificationOutcome, ProtocolError> {
        let request = self.get(id)?;
        Ok(VerificationOutcome {
            completed: request.is_completed(),
            result: request.is_completed() && request.result,
        })
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use zkyc_core::{Amount, PredicateKind, PredicateParams};

    fn request(id: u64, subject: u64) -> VerificationRequest {
        VerificationRequest {
            id: RequestId(id),
            kind: PredicateKind::AgeThreshold,
            requester: AccountId::from_low_u64(50),
            subject: AccountId::from_low_u64(subject),
            params: PredicateParams::AgeThreshold,
            fee: Amount(1000),
            state: VerificationState::Pending,
            result: false,
            nullifier_hash: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_ids_start_at_one() {
        assert_eq!(SessionBook::new().next_id(), RequestId(1));
    }

    #[test]
    fn test_pending_index_ordered() {
        let mut book = SessionBook::new();
        book.apply_created(request(1, 100));
        book.apply_created(request(2, 200));
        book.apply_created(request(3, 100));

        assert_eq!(
            book.pending_for(&AccountId::from_low_u64(100)),
            vec![RequestId(1), RequestId(3)]
        );
        assert_eq!(book.next_id(), RequestId(4));
    }

    #[test]
    fn test_completion_leaves_pending_index() {
        let mut book = SessionBook::new();
        book.apply_created(request(1, 100));
        let mut done = request(1, 100);
        done.state = VerificationState::Completed;
        done.result = true;
        book.apply_completed(done);

        assert!(book.pending_for(&AccountId::from_low_u64(100)).is_empty());
        assert_eq!(
            book.outcome(RequestId(1)).unwrap(),
            VerificationOutcome {
                completed: true,
                result: true
            }
        );
    }

    #[test]
    fn test_outcome_unknown() {
        let book = SessionBook::new();
        assert!(book.outcome(RequestId(9)).is_err());
    }

    #[test]
    fn test_restore_rebuilds_index_and_counter() {
        let mut done = request(2, 100);
        done.state = VerificationState::Completed;
        let book = SessionBook::restore(vec![request(1, 100), done, request(3, 100)], None);

        assert_eq!(
            book.pending_for(&AccountId::from_low_u64(100)),
            vec![RequestId(1), RequestId(3)]
        );
        assert_eq!(book.next_id(), RequestId(4));

        let book = SessionBook::restore(vec![request(1, 100)], Some(RequestId(10)));
        assert_eq!(book.next_id(), RequestId(10));
    }
}
