// Copyright 2025 - Nym Technologies SA <contact@nymtech.net>
// SPDX-License-Identifier: Apache-2.0

use crate::cli::CommonArgs;
use crate::error::OrchestratorError;
use crate::stack::Stack;
use clap::Subcommand;
use tokio_util::sync::CancellationToken;

#[derive(clap::Args, Debug)]
pub(crate) struct Args {
    #[clap(subcommand)]
    command: AccountsCommand,
}

#[derive(Subcommand, Debug)]
enum AccountsCommand {
    /// Create a new account. Fabric expects `<org_name> <account_name>`,
    /// quorum expects `<org_name> <node_name> <member_index>`
    Create {
        /// Name of the stack
        name: String,

        /// Provider specific arguments
        #[clap(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,

        #[clap(flatten)]
        common: CommonArgs,
    },

    /// List every account of the stack
    List {
        /// Name of the stack
        name: String,

        #[clap(flatten)]
        common: CommonArgs,
    },
}

pub(crate) async fn execute(args: Args, cancel: CancellationToken) -> Result<(), OrchestratorError> {
    match args.command {
        AccountsCommand::Create {
            name,
            args,
            common,
        } => {
            let manager = common.stack_manager_for(cancel, &name)?;
            let account = manager.create_account(&name, &args).await?;
            println!("{}", serde_json::to_string_pretty(&account)?);
        }
        AccountsCommand::List { name, common } => {
            let stack = Stack::load(common.stacks_dir()?, &name)?;
            println!("{}", serde_json::to_string_pretty(&stack.state.accounts)?);
        }
    }
    Ok(())
}
