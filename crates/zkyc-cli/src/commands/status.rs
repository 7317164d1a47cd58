//! `zkyc status` — Query the status of a running zkyc node.

use clap::Args;
use serde::Deserialize;
use zkyc_core::Capabilities;

use crate::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct StatusArgs {
    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Deserialize)]
struct StatusResponse {
    version: String,
    protocol_version: String,
    issuer: String,
    backend: String,
    hasher: String,
    uptime_secs: u64,
}

pub async fn run(args: &StatusArgs) -> anyhow::Result<()> {
    let client = NodeClient::new(&args.endpoint);
    let status: StatusResponse = client.get("status", "/status").await?;
    let caps: Capabilities = client.get("capabilities", "/capabilities").await?;

    println!("Node Status:");
    println!("  Version:    {}", status.version);
    println!("  Protocol:   {}", status.protocol_version);
    println!("  Issuer:     {}", status.issuer);
    println!("  Backend:    {}", status.backend);
    println!("  Hasher:     {}", status.hasher);
    println!("  Uptime:     {}s", status.uptime_secs);
    println!("  Reward:     {} bps to subject", caps.subject_reward_bps);
    for kind in &caps.kinds {
        println!(
            "  Predicate:  {} (min fee {}, {} public signals)",
            kind.kind, kind.minimum_fee, kind.public_signals
        );
    }
    Ok(())
}
