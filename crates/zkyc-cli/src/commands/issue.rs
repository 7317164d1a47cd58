//! `zkyc issue` — Prepare a credential locally and register its commitments.
//!
//! The raw attributes never leave this machine. Salts and the subject secret
//! are drawn here, the three commitments are sent to the node, and the private
//! opening is written into the wallet for the subject.

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use zkyc_core::{AccountId, CredentialCommitments, CredentialRecord};
use zkyc_crypto::{actions, SignedEnvelope, SignedPayload};
use zkyc_registry::CredentialIssuer;

use super::{load_key, load_wallet, save_wallet, HasherArg, DEFAULT_KEY, DEFAULT_WALLET};
use crate::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct IssueArgs {
    /// Issuer signing key. Its account must be the node's configured issuer.
    #[arg(short, long, default_value = DEFAULT_KEY)]
    pub key: PathBuf,

    /// Subject account receiving the credential.
    #[arg(short, long)]
    pub subject: String,

    /// Display label for the credential.
    #[arg(short, long, default_value = "aadhaar")]
    pub label: String,

    /// 12-digit Aadhaar number.
    #[arg(long)]
    pub aadhaar: String,

    /// Date of birth (YYYY-MM-DD).
    #[arg(long)]
    pub dob: String,

    /// State name or census code.
    #[arg(long)]
    pub state: String,

    /// Wallet file that receives the private opening.
    #[arg(short, long, default_value = DEFAULT_WALLET)]
    pub wallet: PathBuf,

    #[arg(long, value_enum, default_value = "poseidon")]
    pub hasher: HasherArg,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct IssueRequest {
    subject: AccountId,
    label: String,
    commitments: CredentialCommitments,
}

pub async fn run(args: &IssueArgs) -> anyhow::Result<()> {
    let key = load_key(&args.key)?;
    let caller = key.account();
    let subject = AccountId::parse(&args.subject)?;
    let hasher = args.hasher.build();
    let wallet = load_wallet(&args.wallet)?;

    let issuer = CredentialIssuer::new(caller, hasher.clone());
    let prepared = issuer.prepare(
        &mut rand::rngs::OsRng,
        subject,
        &args.label,
        &args.aadhaar,
        &args.dob,
        &args.state,
    )?;

    let client = NodeClient::new(&args.endpoint);
    let envelope = SignedEnvelope::seal(
        &key,
        &SignedPayload::new(
            actions::ISSUE,
            IssueRequest {
                subject,
                label: prepared.label.clone(),
                commitments: prepared.commitments,
            },
        ),
    )?;
    let record: CredentialRecord = client
        .post("issuance", "/credentials/issue", &envelope)
        .await?;

    wallet.store(hasher.as_ref(), prepared)?;
    save_wallet(&args.wallet, &wallet)?;

    println!("Credential issued!");
    println!("  Subject:      {}", subject);
    println!("  Label:        {}", record.label);
    println!("  Aadhaar hash: {}", record.aadhaar_hash);
    println!("  Secret hash:  {}", record.secret_hash);
    println!("  State commit: {}", record.state_commitment);
    println!("  Opening saved to {}", args.wallet.display());
    Ok(())
}
