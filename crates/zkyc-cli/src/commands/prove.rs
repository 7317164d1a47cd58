//! `zkyc prove` — Answer a pending request from the local wallet.
//!
//! Uses the in-process development backend, which matches a node running
//! `backend.mode = "dev"` with the same hasher.

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use zkyc_core::{AccountId, FieldElement, Groth16Proof, VerificationOutcome, VerificationRequest};
use zkyc_prover::{DevelopmentBackend, ProofRequest, WitnessAssembler};

use super::{load_wallet, HasherArg, DEFAULT_WALLET};
use crate::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct ProveArgs {
    /// Request id to answer.
    #[arg(short, long)]
    pub id: u64,

    /// Subject whose opening is used. Defaults to the request's subject.
    #[arg(short, long)]
    pub subject: Option<String>,

    #[arg(short, long, default_value = DEFAULT_WALLET)]
    pub wallet: PathBuf,

    #[arg(long, value_enum, default_value = "poseidon")]
    pub hasher: HasherArg,

    /// Print the proof instead of submitting it.
    #[arg(long)]
    pub dry_run: bool,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SubmitProofRequest {
    proof: Groth16Proof,
    public_signals: Vec<FieldElement>,
}

pub async fn run(args: &ProveArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.endpoint);
    let request: VerificationRequest = client
        .get("request lookup", &format!("/requests/{}", args.id))
        .await?;
    if request.is_completed() {
        anyhow::bail!("request #{} is already completed", request.id);
    }

    let subject = match &args.subject {
        Some(raw) => AccountId::parse(raw)?,
        None => request.subject,
    };
    let wallet = load_wallet(&args.wallet)?;
    let entry = wallet
        .get(&subject)
        .ok_or_else(|| anyhow::anyhow!("no credential for {} in {}", subject, args.wallet.display()))?;

    let hasher = args.hasher.build();
    let backend = Arc::new(DevelopmentBackend::new(hasher.clone()));
    let assembler = WitnessAssembler::new(hasher, backend);
    let output = assembler
        .prove_now(&entry.opening, &ProofRequest::from(&request))
        .await?;

    if args.dry_run {
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    let outcome: VerificationOutcome = client
        .post(
            "proof submission",
            &format!("/requests/{}/proof", request.id),
            &SubmitProofRequest {
                proof: output.proof,
                public_signals: output.public_signals,
            },
        )
        .await?;

    println!("Proof accepted for request #{}", request.id);
    println!("  Kind:    {}", request.kind);
    println!("  Result:  {}", outcome.result);
    Ok(())
}
