//! zkyc CLI — issuer, requester and subject commands.
//!
//! Subcommands: init, status, issue, revoke, request, pending, prove,
//! result, balance.

mod client;
mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

/// zkyc — replay-safe zero-knowledge identity attestations.
#[derive(Parser, Debug)]
#[command(name = "zkyc", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty local wallet.
    Init(commands::init::InitArgs),
    /// Query the status and capabilities of a running node.
    Status(commands::status::StatusArgs),
    /// Issue a credential (issuer only).
    Issue(commands::issue::IssueArgs),
    /// Revoke a credential (issuer only).
    Revoke(commands::revoke::RevokeArgs),
    /// Open a funded verification request.
    Request(commands::request::RequestArgs),
    /// List a subject's pending requests.
    Pending(commands::pending::PendingArgs),
    /// Prove and submit an answer to a pending request.
    Prove(commands::prove::ProveArgs),
    /// Show a request's outcome.
    #[command(name = "result")]
    Outcome(commands::result::ResultArgs),
    /// Show or fund an account balance.
    Balance(commands::balance::BalanceArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Status(args) => commands::status::run(args).await,
        Commands::Issue(args) => commands::issue::run(args).await,
        Commands::Revoke(args) => commands::revoke::run(args).await,
        Commands::Request(args) => commands::request::run(args).await,
        Commands::Pending(args) => commands::pending::run(args).await,
        Commands::Prove(args) => commands::prove::run(args).await,
        Commands::Outcome(args) => commands::result::run(args).await,
        Commands::Balance(args) => commands::balance::run(args).await,
    }
}
