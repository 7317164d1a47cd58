//! `zkyc revoke` — Revoke a subject's credential (issuer only).

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use zkyc_core::AccountId;
use zkyc_crypto::{actions, SignedEnvelope, SignedPayload};

use super::{load_key, DEFAULT_KEY};
use crate::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct RevokeArgs {
    /// Issuer signing key.
    #[arg(short, long, default_value = DEFAULT_KEY)]
    pub key: PathBuf,

    /// Subject whose credential is revoked.
    #[arg(short, long)]
    pub subject: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct RevokeRequest {
    subject: AccountId,
}

pub async fn run(args: &RevokeArgs) -> anyhow::Result<()> {
    let key = load_key(&args.key)?;
    let subject = AccountId::parse(&args.subject)?;
    let envelope = SignedEnvelope::seal(
        &key,
        &SignedPayload::new(actions::REVOKE, RevokeRequest { subject }),
    )?;
    let client = NodeClient::new(&args.endpoint);
    let _: serde_json::Value = client
        .post("revocation", "/credentials/revoke", &envelope)
        .await?;
    println!("Credential revoked for {}", subject);
    println!("  The secret hash stays revoked even if the subject is reissued.");
    Ok(())
}
