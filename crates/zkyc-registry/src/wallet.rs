use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use zkyc_core::{AccountId, CredentialCommitments, ProtocolError};
use zkyc_crypto::{CredentialOpening, FieldHasher};

use crate::issuer::PreparedCredential;

/// A credential opening as kept by its subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WalletEntry {
    pub label: String,
    pub commitments: CredentialCommitments,
    pub opening: CredentialOpening,
}

/// Subject-side store of private credential openings, keyed by subject account.
#[derive(Debug, Default)]
pub struct SubjectWallet {
    entries: DashMap<AccountId, WalletEntry>,
}

impl SubjectWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a prepared credential after checking that the opening really
    /// produces the published commitments.
    pub fn store<H: FieldHasher + ?Sized>(
        &self,
        hasher: &H,
        prepared: PreparedCredential,
    ) -> Result<(), ProtocolError> {
        if prepared.opening.commitments(hasher) != prepared.commitments {
            return Err(ProtocolError::InvalidInput(format!(
                "opening for {} does not match its commitments under {}",
                prepared.subject,
                hasher.name()
            )));
        }
        self.entries.insert(
            prepared.subject,
            WalletEntry {
                label: prepared.label,
                commitments: prepared.commitments,
                opening: prepared.opening,
            },
        );
        tracing::debug!(subject = %prepared.subject, "credential stored in wallet");
        Ok(())
    }

    pub fn get(&self, subject: &AccountId) -> Option<WalletEntry> {
        self.entries.get(subject).map(|e| e.clone())
    }

    pub fn remove(&self, subject: &AccountId) -> Option<WalletEntry> {
        self.entries.remove(subject).map(|(_, entry)| entry)
    }

    pub fn subjects(&self) -> Vec<AccountId> {
        self.entries.iter().map(|e| *e.key()).collect()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Export as a JSON object keyed by account.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        let map: std::collections::BTreeMap<String, WalletEntry> = self
            .entries
            .iter()
            .map(|e| (e.key().to_string(), e.value().clone()))
            .collect();
        serde_json::to_string_pretty(&map)
            .map_err(|e| ProtocolError::InvalidInput(format!("wallet export: {}", e)))
    }

    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        let map: std::collections::BTreeMap<String, WalletEntry> = serde_json::from_str(json)
            .map_err(|e| ProtocolError::InvalidInput(format!("wallet import: {}", e)))?;
        let wallet = Self::new();
        for (account, entry) in map {
            wallet.entries.insert(AccountId::parse(&account)?, entry);
        }
        Ok(wallet)
    }
}
