//! `zkyc result` — Show the outcome of a verification request.

use clap::Args;
use zkyc_core::{VerificationOutcome, VerificationRequest};

use crate::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct ResultArgs {
    /// Request id.
    #[arg(short, long)]
    pub id: u64,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

pub async fn run(args: &ResultArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.endpoint);
    let outcome: VerificationOutcome = client
        .get("result lookup", &format!("/requests/{}/result", args.id))
        .await?;
    let request: VerificationRequest = client
        .get("request lookup", &format!("/requests/{}", args.id))
        .await?;

    println!("Request #{}:", request.id);
    println!("  Kind:       {}", request.kind);
    println!("  Subject:    {}", request.subject);
    println!("  Requester:  {}", request.requester);
    println!("  State:      {}", request.state);
    if outcome.completed {
        println!("  Result:     {}", outcome.result);
        if let Some(at) = request.completed_at {
            println!("  Completed:  {}", at.to_rfc3339());
        }
    } else {
        println!("  Result:     (awaiting proof)");
    }
    Ok(())
}
