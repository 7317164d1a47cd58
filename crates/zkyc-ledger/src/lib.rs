//! zkyc Ledger — the authoritative record of credentials, verification
//! requests and consumed nullifiers, and the engine that settles proofs
//! against it.

pub mod engine;
pub mod events;
pub mod ledger;
pub mod nullifiers;
pub mod sessions;
pub mod store;

pub use engine::{check_submission, AdmittedSubmission};
pub use events::LedgerEvent;
pub use ledger::{Ledger, LedgerComponents};
pub use nullifiers::NullifierSet;
pub use sessions::SessionBook;
pub use store::{LedgerSnapshot, LedgerStore, MemoryStore, StoreBatch, StoreError, StoreOp};
