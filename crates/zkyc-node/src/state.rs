use std::sync::Arc;
use std::time::Instant;
use zkyc_ledger::Ledger;

use crate::auth::RequestAuthenticator;

/// Shared state accessible from HTTP handlers.
pub struct NodeState {
    pub ledger: Arc<Ledger>,
    /// Name of the field hash the backend evaluates circuits with.
    pub hasher: &'static str,
    pub backend: String,
    /// Checks signed envelopes on mutating calls.
    pub auth: RequestAuthenticator,
    pub start_time: Instant,
}
