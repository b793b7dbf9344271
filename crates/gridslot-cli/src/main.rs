#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod command;
mod config;

use std::process;

use anyhow::Context;

use crate::config::Cli;

// Tracing target constants
pub const TRACING_TARGET_STARTUP: &str = "gridslot_cli::startup";
pub const TRACING_TARGET_COMMAND: &str = "gridslot_cli::command";
pub const TRACING_TARGET_CONFIG: &str = "gridslot_cli::config";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_COMMAND,
            error = %error,
            "command failed"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::init();
    Cli::init_tracing()?;
    cli.log();
    cli.validate()?;

    let store = cli
        .store
        .open()
        .await
        .context("failed to open blob store")?;

    cli.command.execute(&store).await
}
