//! The zkyc node orchestrator.
//!
//! Opens the durable store, selects the proving backend, builds the ledger and
//! serves it over HTTP.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast;

use zkyc_core::{ProofVerifier, VerificationKey};
use zkyc_crypto::{Blake3FieldHasher, FieldHasher, PoseidonHasher};
use zkyc_ledger::{Ledger, LedgerComponents, LedgerEvent, LedgerStore};
use zkyc_prover::{DevelopmentBackend, SnarkjsBackend};
use zkyc_registry::state_codes;
use zkyc_settlement::InternalRail;

use crate::auth::RequestAuthenticator;
use crate::config::{BackendMode, HasherChoice, NodeConfig};
use crate::state::NodeState;
use crate::storage::RocksStore;

pub struct ZkycNode {
    config: NodeConfig,
    state: Arc<NodeState>,
}

impl ZkycNode {
    /// Open RocksDB under the configured data directory and build the node.
    pub fn new(config: NodeConfig) -> Result<Self> {
        config.validate()?;
        let store = RocksStore::open(&config.storage.data_dir)
            .with_context(|| format!("opening {}", config.storage.data_dir.display()))?;
        Self::with_store(config, Arc::new(store))
    }

    /// Build the node over an arbitrary store.
    pub fn with_store(config: NodeConfig, store: Arc<dyn LedgerStore>) -> Result<Self> {
        config.validate()?;
        let hasher: Arc<dyn FieldHasher> = match config.backend.hasher {
            HasherChoice::Poseidon => Arc::new(PoseidonHasher),
            HasherChoice::Blake3 => Arc::new(Blake3FieldHasher),
        };

        let (verifier, verification_keys, backend_id): (Arc<dyn ProofVerifier>, Vec<VerificationKey>, String) =
            match config.backend.mode {
                BackendMode::Dev => {
                    tracing::warn!("development backend selected: proofs are not zero-knowledge");
                    let backend = DevelopmentBackend::new(hasher.clone());
                    let keys = backend.verification_keys(&state_codes());
                    (Arc::new(backend), keys, "dev".into())
                }
                BackendMode::Snarkjs => {
                    let snarkjs = config
                        .backend
                        .snarkjs
                        .clone()
                        .context("missing [backend.snarkjs] section")?;
                    let backend = SnarkjsBackend::new(snarkjs);
                    let keys = backend.load_verification_keys()?;
                    (Arc::new(backend), keys, "snarkjs".into())
                }
            };

        let rail = Arc::new(InternalRail::new(config.payments.allow_deposits));
        let ledger = Ledger::open(
            config.protocol.clone(),
            LedgerComponents {
                verifier,
                verification_keys,
                rail,
                store,
            },
        )?;

        let state = Arc::new(NodeState {
            ledger: Arc::new(ledger),
            hasher: hasher.name(),
            backend: backend_id,
            auth: RequestAuthenticator::new(config.api.max_request_age_secs),
            start_time: Instant::now(),
        });

        tracing::info!(
            issuer = %config.protocol.issuer,
            backend = %state.backend,
            hasher = state.hasher,
            "zkyc node created"
        );
        Ok(Self { config, state })
    }

    pub fn state(&self) -> Arc<NodeState> {
        self.state.clone()
    }

    /// Serve the HTTP API until it fails.
    pub async fn run(&self) -> Result<()> {
        let events = self.state.ledger.subscribe();
        tokio::spawn(log_events(events));

        let addr = self.config.api_socket_addr()?;
        crate::api::start_api_server(addr, self.state.clone()).await
    }
}

/// Mirror ledger events into the log.
async fn log_events(mut events: broadcast::Receiver<LedgerEvent>) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => tracing::info!(target: "zkyc::events", event = %json, "ledger event"),
                Err(e) => tracing::warn!(error = %e, "failed to encode ledger event"),
            },
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "event log lagged");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zkyc_ledger::MemoryStore;

    #[test]
    fn test_dev_node_offers_both_kinds() {
        let node = ZkycNode::with_store(NodeConfig::default(), Arc::new(MemoryStore::new())).unwrap();
        let caps = node.state().ledger.capabilities();
        assert_eq!(caps.kinds.len(), 2);
        assert_eq!(caps.kinds[1].required_states, state_codes());
        assert_eq!(node.state().backend, "dev");
        assert_eq!(node.state().hasher, "poseidon-bn254-t3");
    }

    #[test]
    fn test_snarkjs_node_requires_vkeys() {
        let mut config = NodeConfig::default();
        config.backend.mode = BackendMode::Snarkjs;
        config.backend.snarkjs = Some(
            serde_json::from_value(serde_json::json!({
                "age_threshold": {"wasm": "/nope/a.wasm", "zkey": "/nope/a.zkey", "vkey": "/nope/a.json"},
                "state_equality": [
                    {"required_state": 27, "wasm": "/nope/s.wasm", "zkey": "/nope/s.zkey", "vkey": "/nope/s.json"}
                ],
            }))
            .unwrap(),
        );
        assert!(ZkycNode::with_store(config, Arc::new(MemoryStore::new())).is_err());
    }
}
