// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::cli::CommonArgs;
use crate::error::OrchestratorError;
use tokio_util::sync::CancellationToken;

#[derive(clap::Args, Debug)]
pub(crate) struct Args {
    /// Name of the stack
    name: String,

    #[clap(flatten)]
    common: CommonArgs,
}

pub(crate) async fn execute(args: Args, cancel: CancellationToken) -> Result<(), OrchestratorError> {
    let manager = args.common.stack_manager(cancel, None)?;
    manager.stop(&args.name).await?;
    println!("stack '{}' stopped", args.name);
    Ok(())
}
