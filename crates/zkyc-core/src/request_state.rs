use std::fmt;

/// Lifecycle of a verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum VerificationState {
    /// Created and funded, waiting for a proof.
    Pending,
    /// A proof was accepted and the fee settled. Final state.
    Completed,
}

impl VerificationState {
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for VerificationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

/// Events that move a request between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationEvent {
    /// A submitted proof passed every settlement check.
    ProofAccepted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid request transition from {from} on {event:?}")]
pub struct InvalidTransition {
    pub from: VerificationState,
    pub event: VerificationEvent,
}

/// Valid transitions:
/// - Pending → Completed (ProofAccepted)
///
/// There is no cancellation or expiry.
pub struct RequestStateMachine;

impl RequestStateMachine {
    pub fn transition(
        current: VerificationState,
        event: VerificationEvent,
    ) -> Result<VerificationState, InvalidTransition> {
        let next = match (current, event) {
            (VerificationState::Pending, VerificationEvent::ProofAccepted) => {
                VerificationState::Completed
            }
            _ => {
                return Err(InvalidTransition {
                    from: current,
                    event,
                })
            }
        };

        tracing::debug!(from = %current, to = %next, event = ?event, "request state transition");
        Ok(next)
    }

    pub fn can_transition(current: VerificationState, event: VerificationEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_to_completed() {
        let next =
            RequestStateMachine::transition(VerificationState::Pending, VerificationEvent::ProofAccepted)
                .unwrap();
        assert_eq!(next, VerificationState::Completed);
        assert!(next.is_final());
    }

    #[test]
    fn test_completed_never_reopens() {
        let err = RequestStateMachine::transition(
            VerificationState::Completed,
            VerificationEvent::ProofAccepted,
        )
        .unwrap_err();
        assert_eq!(err.from, VerificationState::Completed);
        assert!(!RequestStateMachine::can_transition(
            VerificationState::Completed,
            VerificationEvent::ProofAccepted
        ));
    }
}
