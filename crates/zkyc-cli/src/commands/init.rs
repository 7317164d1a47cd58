//! `zkyc init` — Create an empty local wallet and a signing key.

use clap::Args;
use std::path::PathBuf;
use zkyc_crypto::KeyPair;
use zkyc_registry::SubjectWallet;

use super::{load_key, save_key, save_wallet, DEFAULT_KEY, DEFAULT_WALLET};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Wallet file holding credential openings.
    #[arg(short, long, default_value = DEFAULT_WALLET)]
    pub wallet: PathBuf,

    /// Signing key file. Its account acts as issuer or requester.
    #[arg(short, long, default_value = DEFAULT_KEY)]
    pub key: PathBuf,

    /// Overwrite an existing wallet and key.
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: &InitArgs) -> anyhow::Result<()> {
    if args.wallet.exists() && !args.force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            args.wallet.display()
        );
    }
    save_wallet(&args.wallet, &SubjectWallet::new())?;
    println!("Initialized empty wallet at {}", args.wallet.display());

    let key = if args.key.exists() && !args.force {
        load_key(&args.key)?
    } else {
        let key = KeyPair::generate();
        save_key(&args.key, &key)?;
        println!("Generated signing key at {}", args.key.display());
        key
    };
    println!("  Account: {}", key.account());
    println!("Keep both files private: they hold credential secrets and your signing key.");
    Ok(())
}
