//! warden Server Binary
//!
//! Migrates the store and serves sign-in and sign-up, or runs migration
//! commands on their own. Configuration comes from flags or environment.

use clap::Parser;
use warden::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    log()?;
    Cli::parse()
        .run()
        .await
        .inspect_err(|e| log::error!("fatal error={:#}", e))
}
