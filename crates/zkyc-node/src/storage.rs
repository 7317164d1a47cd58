//! RocksDB storage backend for the zkyc node.

use rocksdb::{ColumnFamily, ColumnFamilyDescriptor, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;

use zkyc_core::{AccountId, CredentialRecord, FieldElement, RequestId, VerificationRequest};
use zkyc_ledger::{LedgerSnapshot, LedgerStore, StoreBatch, StoreError, StoreOp};

/// Column family names for different data types.
const CF_CREDENTIALS: &str = "credentials";
const CF_REVOCATIONS: &str = "revocations";
const CF_REQUESTS: &str = "requests";
const CF_NULLIFIERS: &str = "nullifiers";
const CF_META: &str = "meta";

const KEY_NEXT_REQUEST_ID: &[u8] = b"next_request_id";

/// RocksDB-backed ledger store. Each [`StoreBatch`] is written as a single
/// RocksDB `WriteBatch`.
pub struct RocksStore {
    db: DB,
}

fn backend(e: rocksdb::Error) -> StoreError {
    StoreError::Backend(e.to_string())
}

impl RocksStore {
    /// Open or create a RocksDB database at the given path with column families.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path).map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new(CF_CREDENTIALS, Options::default()),
            ColumnFamilyDescriptor::new(CF_REVOCATIONS, Options::default()),
            ColumnFamilyDescriptor::new(CF_REQUESTS, Options::default()),
            ColumnFamilyDescriptor::new(CF_NULLIFIERS, Options::default()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors).map_err(backend)?;
        tracing::info!(path = %path.display(), "ledger store opened");

        Ok(Self { db })
    }

    fn cf(&self, name: &str) -> Result<&ColumnFamily, StoreError> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Backend(format!("column family '{}' not found", name)))
    }

    fn encode<T: serde::Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        serde_json::to_vec(value).map_err(|e| StoreError::Corrupt(e.to_string()))
    }

    fn decode<T: serde::de::DeserializeOwned>(cf: &str, raw: &[u8]) -> Result<T, StoreError> {
        serde_json::from_slice(raw).map_err(|e| StoreError::Corrupt(format!("{}: {}", cf, e)))
    }

    fn decode_u64(cf: &str, raw: &[u8]) -> Result<u64, StoreError> {
        let bytes: [u8; 8] = raw
            .try_into()
            .map_err(|_| StoreError::Corrupt(format!("{}: expected 8-byte id", cf)))?;
        Ok(u64::from_be_bytes(bytes))
    }

    fn scan(&self, name: &str) -> Result<Vec<(Box<[u8]>, Box<[u8]>)>, StoreError> {
        let cf = self.cf(name)?;
        self.db
            .iterator_cf(&cf, IteratorMode::Start)
            .map(|item| item.map_err(backend))
            .collect()
    }
}

impl LedgerStore for RocksStore {
    fn commit(&self, batch: StoreBatch) -> Result<(), StoreError> {
        let mut write = WriteBatch::default();
        for op in batch.into_ops() {
            match op {
                StoreOp::PutCredential { subject, record } => {
                    write.put_cf(&self.cf(CF_CREDENTIALS)?, subject.as_bytes(), Self::encode(&record)?);
                }
                StoreOp::AddRevocation(secret_hash) => {
                    write.put_cf(&self.cf(CF_REVOCATIONS)?, secret_hash.to_le_bytes(), b"");
                }
                StoreOp::PutRequest(request) => {
                    write.put_cf(
                        &self.cf(CF_REQUESTS)?,
                        request.id.0.to_be_bytes(),
                        Self::encode(&request)?,
                    );
                }
                StoreOp::AddNullifier {
                    nullifier,
                    request_id,
                } => {
                    write.put_cf(
                        &self.cf(CF_NULLIFIERS)?,
                        nullifier.to_le_bytes(),
                        request_id.0.to_be_bytes(),
                    );
                }
                StoreOp::SetNextRequestId(id) => {
                    write.put_cf(&self.cf(CF_META)?, KEY_NEXT_REQUEST_ID, id.0.to_be_bytes());
                }
            }
        }
        self.db.write(write).map_err(backend)
    }

    fn load(&self) -> Result<LedgerSnapshot, StoreError> {
        let mut snapshot = LedgerSnapshot::default();

        for (key, value) in self.scan(CF_CREDENTIALS)? {
            let bytes: [u8; 20] = key
                .as_ref()
                .try_into()
                .map_err(|_| StoreError::Corrupt("credentials: bad subject key".into()))?;
            let record: CredentialRecord = Self::decode(CF_CREDENTIALS, &value)?;
            snapshot.credentials.insert(AccountId(bytes), record);
        }
        for (key, _) in self.scan(CF_REVOCATIONS)? {
            snapshot
                .revocations
                .push(FieldElement::from_le_bytes_mod_order(&key));
        }
        for (_, value) in self.scan(CF_REQUESTS)? {
            let request: VerificationRequest = Self::decode(CF_REQUESTS, &value)?;
            snapshot.requests.insert(request.id, request);
        }
        for (key, value) in self.scan(CF_NULLIFIERS)? {
            let request_id = RequestId(Self::decode_u64(CF_NULLIFIERS, &value)?);
            snapshot
                .nullifiers
                .insert(FieldElement::from_le_bytes_mod_order(&key), request_id);
        }
        let meta = self.cf(CF_META)?;
        if let Some(raw) = self.db.get_cf(&meta, KEY_NEXT_REQUEST_ID).map_err(backend)? {
            snapshot.next_request_id = Some(RequestId(Self::decode_u64(CF_META, &raw)?));
        }

        tracing::debug!(
            credentials = snapshot.credentials.len(),
            requests = snapshot.requests.len(),
            nullifiers = snapshot.nullifiers.len(),
            "ledger snapshot loaded"
        );
        Ok(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::path::PathBuf;
    use zkyc_core::{Amount, PredicateKind, PredicateParams, VerificationState};

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("zkyc-test-{}", rand::random::<u64>()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn record(label: &str) -> CredentialRecord {
        CredentialRecord {
            aadhaar_hash: FieldElement::from_u64(11),
            secret_hash: FieldElement::from_u64(12),
            state_commitment: FieldElement::from_u64(13),
            label: label.into(),
            is_active: true,
            issued_at: Utc::now(),
        }
    }

    fn request(id: u64) -> VerificationRequest {
        VerificationRequest {
            id: RequestId(id),
            kind: PredicateKind::StateEquality,
            requester: AccountId::from_low_u64(50),
            subject: AccountId::from_low_u64(100),
            params: PredicateParams::StateEquality { required_state: 27 },
            fee: Amount(1_000),
            state: VerificationState::Pending,
            result: false,
            nullifier_hash: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    #[test]
    fn test_open_storage() {
        let dir = temp_dir();
        let store = RocksStore::open(&dir).unwrap();
        assert_eq!(store.load().unwrap(), LedgerSnapshot::default());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_commit_and_reload() {
        let dir = temp_dir();
        let subject = AccountId::from_low_u64(100);
        {
            let store = RocksStore::open(&dir).unwrap();
            let mut batch = StoreBatch::new();
            batch
                .push(StoreOp::PutCredential {
                    subject,
                    record: record("card"),
                })
                .push(StoreOp::PutRequest(request(1)))
                .push(StoreOp::SetNextRequestId(RequestId(2)));
            store.commit(batch).unwrap();

            let mut batch = StoreBatch::new();
            batch
                .push(StoreOp::AddRevocation(FieldElement::from_u64(12)))
                .push(StoreOp::AddNullifier {
                    nullifier: FieldElement::from_u64(777),
                    request_id: RequestId(1),
                });
            store.commit(batch).unwrap();
        }

        let store = RocksStore::open(&dir).unwrap();
        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.credentials[&subject].label, "card");
        assert_eq!(snapshot.requests[&RequestId(1)].fee, Amount(1_000));
        assert_eq!(snapshot.revocations, vec![FieldElement::from_u64(12)]);
        assert_eq!(
            snapshot.nullifiers.get(&FieldElement::from_u64(777)),
            Some(&RequestId(1))
        );
        assert_eq!(snapshot.next_request_id, Some(RequestId(2)));

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_put_request_overwrites() {
        let dir = temp_dir();
        let store = RocksStore::open(&dir).unwrap();

        store
            .commit({
                let mut b = StoreBatch::new();
                b.push(StoreOp::PutRequest(request(4)));
                b
            })
            .unwrap();
        let mut done = request(4);
        done.state = VerificationState::Completed;
        done.result = true;
        store
            .commit({
                let mut b = StoreBatch::new();
                b.push(StoreOp::PutRequest(done));
                b
            })
            .unwrap();

        let snapshot = store.load().unwrap();
        assert_eq!(snapshot.requests.len(), 1);
        assert!(snapshot.requests[&RequestId(4)].result);

        std::fs::remove_dir_all(&dir).ok();
    }
}
