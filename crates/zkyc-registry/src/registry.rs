use chrono::{DateTime, Utc};
use std::collections::{BTreeSet, HashMap};
use zkyc_core::{AccountId, CredentialCommitments, CredentialRecord, FieldElement, ProtocolError};

/// Append-only set of revoked secret hashes.
///
/// A revoked `secretHash` stays untrusted forever, whatever record later
/// reuses it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevocationSet {
    revoked: BTreeSet<FieldElement>,
}

impl RevocationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` if the hash was already revoked.
    pub fn insert(&mut self, secret_hash: FieldElement) -> bool {
        self.revoked.insert(secret_hash)
    }

    pub fn contains(&self, secret_hash: &FieldElement) -> bool {
        self.revoked.contains(secret_hash)
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldElement> {
        self.revoked.iter()
    }
}

/// A validated issuance, ready to be persisted and applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issuance {
    pub subject: AccountId,
    pub record: CredentialRecord,
    /// Whether a previous record was overwritten.
    pub replaced: bool,
}

/// A validated revocation, ready to be persisted and applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revocation {
    pub subject: AccountId,
    pub record: CredentialRecord,
    /// `false` when the secret hash was already in the revocation set.
    pub newly_revoked: bool,
    /// Whether the record was active before this revocation.
    pub was_active: bool,
}

impl Revocation {
    /// Nothing to persist: the record is inactive and its secret is revoked.
    pub fn is_noop(&self) -> bool {
        !self.newly_revoked && !self.was_active
    }
}

/// Issuer-controlled store of one credential record per subject.
///
/// Mutations are split into `plan_*` (all checks, no side effects) and
/// `apply_*` (infallible) so that a caller can persist the change in between.
#[derive(Debug, Clone)]
pub struct CredentialRegistry {
    issuer: AccountId,
    records: HashMap<AccountId, CredentialRecord>,
    revocations: RevocationSet,
}

impl CredentialRegistry {
    pub fn new(issuer: AccountId) -> Self {
        Self {
            issuer,
            records: HashMap::new(),
            revocations: RevocationSet::new(),
        }
    }

    /// Rebuild a registry from persisted records and revocations.
    pub fn restore(
        issuer: AccountId,
        records: impl IntoIterator<Item = (AccountId, CredentialRecord)>,
        revoked: impl IntoIterator<Item = FieldElement>,
    ) -> Self {
        let mut registry = Self::new(issuer);
        registry.records.extend(records);
        for secret_hash in revoked {
            registry.revocations.insert(secret_hash);
        }
        registry
    }

    pub fn issuer(&self) -> AccountId {
        self.issuer
    }

    fn authorize(&self, caller: &AccountId, action: &str) -> Result<(), ProtocolError> {
        if *caller != self.issuer {
            return Err(ProtocolError::Unauthorized {
                caller: *caller,
                action: action.to_string(),
            });
        }
        Ok(())
    }

    pub fn plan_issue(
        &self,
        caller: &AccountId,
        subject: AccountId,
        label: &str,
        commitments: CredentialCommitments,
        issued_at: DateTime<Utc>,
    ) -> Result<Issuance, ProtocolError> {
        self.authorize(caller, "issue credentials")?;
        Ok(Issuance {
            subject,
            record: CredentialRecord {
                aadhaar_hash: commitments.aadhaar_hash,
                secret_hash: commitments.secret_hash,
                state_commitment: commitments.state_commitment,
                label: label.to_string(),
                is_active: true,
                issued_at,
            },
            replaced: self.records.contains_key(&subject),
        })
    }

    pub fn apply_issue(&mut self, issuance: Issuance) {
        tracing::info!(
            subject = %issuance.subject,
            label = %issuance.record.label,
            replaced = issuance.replaced,
            "credential issued"
        );
        self.records.insert(issuance.subject, issuance.record);
    }

    pub fn plan_revoke(
        &self,
        caller: &AccountId,
        subject: &AccountId,
    ) -> Result<Revocation, ProtocolError> {
        self.authorize(caller, "revoke credentials")?;
        let current = self
            .records
            .get(subject)
            .ok_or_else(|| ProtocolError::credential_not_found(subject))?;
        let mut record = current.clone();
        record.is_active = false;
        Ok(Revocation {
            subject: *subject,
            newly_revoked: !self.revocations.contains(&record.secret_hash),
            was_active: current.is_active,
            record,
        })
    }

    pub fn apply_revoke(&mut self, revocation: Revocation) {
        self.revocations.insert(revocation.record.secret_hash);
        tracing::info!(
            subject = %revocation.subject,
            newly_revoked = revocation.newly_revoked,
            "credential revoked"
        );
        self.records.insert(revocation.subject, revocation.record);
    }

    /// Issue and apply in one step.
    pub fn issue(
        &mut self,
        caller: &AccountId,
        subject: AccountId,
        label: &str,
        commitments: CredentialCommitments,
    ) -> Result<CredentialRecord, ProtocolError> {
        let issuance = self.plan_issue(caller, subject, label, commitments, Utc::now())?;
        let record = issuance.record.clone();
        self.apply_issue(issuance);
        Ok(record)
    }

    /// Revoke and apply in one step. Repeated calls succeed without effect.
    pub fn revoke(&mut self, caller: &AccountId, subject: &AccountId) -> Result<(), ProtocolError> {
        let revocation = self.plan_revoke(caller, subject)?;
        self.apply_revoke(revocation);
        Ok(())
    }

    pub fn has_valid_credential(&self, subject: &AccountId) -> bool {
        self.records
            .get(subject)
            .map(|r| r.is_active && !self.revocations.contains(&r.secret_hash))
            .unwrap_or(false)
    }

    pub fn get_commitments(
        &self,
        subject: &AccountId,
    ) -> Result<CredentialCommitments, ProtocolError> {
        self.get_record(subject).map(CredentialRecord::commitments)
    }

    pub fn get_record(&self, subject: &AccountId) -> Result<&CredentialRecord, ProtocolError> {
        self.records
            .get(subject)
            .ok_or_else(|| ProtocolError::credential_not_found(subject))
    }

    pub fn is_secret_hash_revoked(&self, secret_hash: &FieldElement) -> bool {
        self.revocations.contains(secret_hash)
    }

    pub fn revocations(&self) -> &RevocationSet {
        &self.revocations
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
