//! # kominukator
//!
//! Terminal view for the Kominukator chat demo. Every invocation is one
//! "tab": it shares the store document under `--data-dir` with every other
//! tab and keeps its own login session under `tabs/<name>/`.

mod cli;
mod commands;
mod render;

use clap::Parser;
use tracing::debug;

use kominukator_client::{init_tracing, ChatClient, ClientConfig};

use crate::cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    debug!(?config, tab = %cli.tab, "Loaded configuration");

    let client = ChatClient::open_on_disk(config, &cli.tab)?;
    commands::run(client, cli.command).await
}
