//! zkyc Registry — issuer-controlled credential commitments and the
//! permanent revocation set, plus issuer and subject tooling around them.

pub mod issuer;
pub mod registry;
pub mod states;
pub mod wallet;

pub use issuer::{CredentialIssuer, PreparedCredential};
pub use registry::{CredentialRegistry, Issuance, RevocationSet, Revocation};
pub use states::{state_code, state_codes, state_name};
pub use wallet::{SubjectWallet, WalletEntry};
