//! Caller authentication for mutating API calls.
//!
//! A call is accepted when its envelope is signed by the key bound to the
//! acting account, was signed for the endpoint it reached, is no older than
//! the configured window, and its nonce has not been seen from that signer.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use serde::de::DeserializeOwned;

use zkyc_core::{AccountId, ProtocolError};
use zkyc_crypto::{CryptoError, SignedEnvelope};

/// Upper bound on the signature window.
pub const MAX_REQUEST_AGE_SECS: u64 = 86_400;

pub struct RequestAuthenticator {
    max_age: Duration,
    /// Nonces accepted within the window, keyed by signer.
    seen: DashMap<(AccountId, u64), DateTime<Utc>>,
}

impl RequestAuthenticator {
    pub fn new(max_age_secs: u64) -> Self {
        Self {
            max_age: Duration::seconds(max_age_secs.min(MAX_REQUEST_AGE_SECS) as i64),
            seen: DashMap::new(),
        }
    }

    /// Verify an envelope for `action` and return the signer with the body.
    pub fn authenticate<T: DeserializeOwned>(
        &self,
        envelope: &SignedEnvelope,
        action: &str,
    ) -> Result<(AccountId, T), ProtocolError> {
        self.authenticate_at(envelope, action, Utc::now())
    }

    pub fn authenticate_at<T: DeserializeOwned>(
        &self,
        envelope: &SignedEnvelope,
        action: &str,
        now: DateTime<Utc>,
    ) -> Result<(AccountId, T), ProtocolError> {
        let claimed = envelope.claimed_signer()?;
        let deny = |reason: &str| ProtocolError::Unauthorized {
            caller: claimed,
            action: format!("{} ({})", action, reason),
        };

        let opened = envelope.open::<T>().map_err(|e| match e {
            CryptoError::SignatureVerificationFailed => deny("bad signature"),
            other => ProtocolError::from(other),
        })?;
        let payload = opened.payload;

        if payload.action != action {
            return Err(deny(&format!("signed for {}", payload.action)));
        }
        let skew = now.signed_duration_since(payload.signed_at);
        if skew > self.max_age || -skew > self.max_age {
            return Err(deny("signature outside the accepted window"));
        }

        self.prune(now);
        if self
            .seen
            .insert((opened.signer, payload.nonce), payload.signed_at)
            .is_some()
        {
            tracing::warn!(signer = %opened.signer, action, "replayed request rejected");
            return Err(deny("replayed request"));
        }

        Ok((opened.signer, payload.body))
    }

    /// Drop nonces that can no longer pass the freshness check.
    fn prune(&self, now: DateTime<Utc>) {
        let horizon = now - self.max_age - self.max_age;
        self.seen.retain(|_, signed_at| *signed_at >= horizon);
    }
}
