// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::cli::CommonArgs;
use crate::error::OrchestratorError;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

#[derive(clap::Args, Debug)]
pub(crate) struct Args {
    /// Name of the stack
    name: String,

    /// Compiled contract JSON, or chaincode package for fabric stacks
    filename: PathBuf,

    /// Constructor parameters, or `<channel> <chaincode> <version>` for fabric stacks
    #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
    extra_args: Vec<String>,

    #[clap(flatten)]
    common: CommonArgs,
}

pub(crate) async fn execute(args: Args, cancel: CancellationToken) -> Result<(), OrchestratorError> {
    let manager = args.common.stack_manager_for(cancel, &args.name)?;
    let deployed = manager
        .deploy_contract(&args.name, &args.filename, &args.extra_args)
        .await?;
    println!("{}", serde_json::to_string_pretty(&deployed.location)?);
    Ok(())
}
