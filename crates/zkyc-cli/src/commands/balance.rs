//! `zkyc balance` — Show (and optionally fund) an account on the node's rail.

use clap::Args;
use serde::{Deserialize, Serialize};
use zkyc_core::{AccountId, Amount};

use crate::client::{NodeClient, DEFAULT_ENDPOINT};

#[derive(Args, Debug)]
pub struct BalanceArgs {
    #[arg(short, long)]
    pub account: String,

    /// Credit this many base units first (development rail only).
    #[arg(long)]
    pub deposit: Option<Amount>,

    /// API endpoint of the node.
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    pub endpoint: String,
}

#[derive(Serialize)]
struct DepositRequest {
    amount: Amount,
}

#[derive(Deserialize)]
struct BalanceResponse {
    balance: Amount,
}

pub async fn run(args: &BalanceArgs) -> anyhow::Result<()> {
    let account = AccountId::parse(&args.account)?;
    let client = NodeClient::new(&args.endpoint);

    if let Some(amount) = args.deposit {
        let _: BalanceResponse = client
            .post(
                "deposit",
                &format!("/accounts/{}/deposit", account),
                &DepositRequest { amount },
            )
            .await?;
        println!("Deposited {} to {}", amount, account);
    }

    let resp: BalanceResponse = client
        .get("balance lookup", &format!("/accounts/{}/balance", account))
        .await?;
    println!("{}: {}", account, resp.balance);
    Ok(())
}
