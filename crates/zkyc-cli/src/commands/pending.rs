//! `zkyc pending` — List pending verification requests for a subject.

use clap::Args;
use zkyc_core::{AccountId, RequestId, VerificationRequest};

use crate::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct PendingArgs {
    #[arg(short, long)]
    pub subject: String,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(serde::Deserialize)]
struct PendingResponse {
    request_ids: Vec<RequestId>,
}

pub async fn run(args: &PendingArgs) -> anyhow::Result<()> {
    let subject = AccountId::parse(&args.subject)?;
    let client = NodeClient::new(&args.endpoint);
    let pending: PendingResponse = client
        .get("pending lookup", &format!("/subjects/{}/pending", subject))
        .await?;

    if pending.request_ids.is_empty() {
        println!("No pending requests for {}", subject);
        return Ok(());
    }
    println!("Pending requests for {}:", subject);
    for id in pending.request_ids {
        let request: VerificationRequest = client
            .get("request lookup", &format!("/requests/{}", id))
            .await?;
        println!(
            "  #{:<6} {:<15} requester {}  fee {}",
            request.id, request.kind, request.requester, request.fee
        );
    }
    Ok(())
}
