// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::cli::Cli;
use crate::logging::setup_tracing_logger;
use clap::Parser;

mod blockchain;
pub(crate) mod cli;
mod config;
mod container;
mod contracts;
pub(crate) mod error;
mod genesis;
mod helpers;
mod keys;
mod logging;
mod render;
mod rpc;
mod stack;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    setup_tracing_logger();

    cli.execute().await?;

    Ok(())
}
