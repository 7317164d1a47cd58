pub mod balance;
pub mod init;
pub mod issue;
pub mod pending;
pub mod prove;
pub mod request;
pub mod result;
pub mod revoke;
pub mod status;

use clap::ValueEnum;
use std::path::Path;
use std::sync::Arc;
use zkyc_crypto::{Blake3FieldHasher, FieldHasher, KeyPair, PoseidonHasher};
use zkyc_registry::SubjectWallet;

pub const DEFAULT_WALLET: &str = "zkyc-wallet.json";
/// Hex Ed25519 seed that signs issuer and requester calls.
pub const DEFAULT_KEY: &str = "zkyc-key.hex";

/// Field hash used for commitments. Must match the node's backend.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum HasherArg {
    Poseidon,
    Blake3,
}

impl HasherArg {
    pub fn build(self) -> Arc<dyn FieldHasher> {
        match self {
            HasherArg::Poseidon => Arc::new(PoseidonHasher),
            HasherArg::Blake3 => Arc::new(Blake3FieldHasher),
        }
    }
}

pub fn load_wallet(path: &Path) -> anyhow::Result<SubjectWallet> {
    if !path.exists() {
        anyhow::bail!(
            "wallet {} not found (create one with: zkyc init)",
            path.display()
        );
    }
    let raw = std::fs::read_to_string(path)?;
    Ok(SubjectWallet::from_json(&raw)?)
}

fn ensure_parent(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

pub fn save_wallet(path: &Path, wallet: &SubjectWallet) -> anyhow::Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, wallet.to_json()?)?;
    Ok(())
}

pub fn load_key(path: &Path) -> anyhow::Result<KeyPair> {
    if !path.exists() {
        anyhow::bail!(
            "signing key {} not found (create one with: zkyc init)",
            path.display()
        );
    }
    Ok(KeyPair::from_hex(&std::fs::read_to_string(path)?)?)
}

pub fn save_key(path: &Path, key: &KeyPair) -> anyhow::Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, key.secret_hex())?;
    Ok(())
}
