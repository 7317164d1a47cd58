//! `zkyc request` — Open a funded verification request against a subject.

use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use zkyc_core::{AccountId, Amount, PredicateParams, RequestId, DEFAULT_MINIMUM_FEE};
use zkyc_crypto::{actions, SignedEnvelope, SignedPayload};
use zkyc_registry::{state_code, state_name};

use super::{load_key, DEFAULT_KEY};
use crate::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum KindArg {
    /// Subject is at least 18 years old.
    Age,
    /// Subject lives in the given state.
    State,
}

#[derive(Args, Debug)]
pub struct RequestArgs {
    /// Signing key of the account paying the fee.
    #[arg(long, default_value = DEFAULT_KEY)]
    pub key: PathBuf,

    #[arg(short, long)]
    pub subject: String,

    #[arg(short, long, value_enum)]
    pub kind: KindArg,

    /// Required state name or code (state requests only).
    #[arg(long, required_if_eq("kind", "state"))]
    pub state: Option<String>,

    /// Fee in base units.
    #[arg(long, default_value_t = DEFAULT_MINIMUM_FEE)]
    pub fee: Amount,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct CreateRequestBody {
    subject: AccountId,
    params: PredicateParams,
    fee: Amount,
}

#[derive(Deserialize)]
struct CreatedResponse {
    request_id: RequestId,
}

fn params(args: &RequestArgs) -> anyhow::Result<PredicateParams> {
    Ok(match args.kind {
        KindArg::Age => PredicateParams::AgeThreshold,
        KindArg::State => {
            let raw = args
                .state
                .as_deref()
                .ok_or_else(|| anyhow::anyhow!("--state is required for state requests"))?;
            PredicateParams::StateEquality {
                required_state: state_code(raw)?,
            }
        }
    })
}

pub async fn run(args: &RequestArgs) -> anyhow::Result<()> {
    let key = load_key(&args.key)?;
    let body = CreateRequestBody {
        subject: AccountId::parse(&args.subject)?,
        params: params(args)?,
        fee: args.fee,
    };
    let envelope = SignedEnvelope::seal(&key, &SignedPayload::new(actions::REQUEST, &body))?;

    let client = NodeClient::new(&args.endpoint);
    let created: CreatedResponse = client.post("request", "/requests", &envelope).await?;

    println!("Verification requested!");
    println!("  Request id: {}", created.request_id);
    println!("  Requester:  {}", key.account());
    println!("  Kind:       {}", body.params.kind());
    if let PredicateParams::StateEquality { required_state } = body.params {
        println!(
            "  State:      {} ({})",
            state_name(required_state).unwrap_or("unknown"),
            required_state
        );
    }
    println!("  Fee:        {} (held in escrow)", body.fee);
    Ok(())
}
