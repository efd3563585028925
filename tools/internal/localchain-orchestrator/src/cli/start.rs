// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::cli::CommonArgs;
use crate::error::OrchestratorError;
use crate::helpers::ProgressTracker;
use tokio_util::sync::CancellationToken;

#[derive(clap::Args, Debug)]
pub(crate) struct Args {
    /// Name of the stack
    name: String,

    #[clap(flatten)]
    common: CommonArgs,
}

pub(crate) async fn execute(args: Args, cancel: CancellationToken) -> Result<(), OrchestratorError> {
    let manager = args.common.stack_manager_for(cancel, &args.name)?;

    let progress = ProgressTracker::new(format!("🚀 starting stack '{}'", args.name));
    progress.set_pb_message("bootstrapping blockchain services...");
    let stack = progress.with_progress(manager.start(&args.name)).await?;

    for contract in &stack.state.deployed_contracts {
        progress.println(format!(
            "contract '{}' deployed at {}",
            contract.name, contract.location
        ));
    }
    progress.println(format!("stack '{}' is running", stack.name));
    Ok(())
}
